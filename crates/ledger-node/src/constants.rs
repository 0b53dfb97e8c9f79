pub(crate) const DEFAULT_PORT: u16 = 6689;
pub(crate) const DEFAULT_HOST: &str = "127.0.0.1";
