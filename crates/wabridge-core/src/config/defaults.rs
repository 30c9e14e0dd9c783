pub(super) fn default_name() -> String {
    "wabridge".to_string()
}
pub(super) fn default_data_dir() -> String {
    "~/.wabridge".to_string()
}
pub(super) fn default_log_level() -> String {
    "info".to_string()
}
pub(super) fn default_host() -> String {
    "0.0.0.0".to_string()
}
pub(super) fn default_port() -> u16 {
    8080
}
pub(super) fn default_client_buffer() -> usize {
    256
}
pub(super) fn default_device_name() -> String {
    "wabridge".to_string()
}
pub(super) fn default_language() -> String {
    "English".to_string()
}
pub(super) fn default_true() -> bool {
    true
}
