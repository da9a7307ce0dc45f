//! Configuration defaults for keju.
//!
//! Default value functions used by serde when a key is absent from
//! `validation.json`.

/// Name of the configuration file inside the validation folder.
pub const CONFIG_FILE_NAME: &str = "validation.json";

// Default value functions for serde
pub(crate) fn default_build_folder() -> String {
    "./build/".to_string()
}
pub(crate) fn default_unittest_xml_output() -> String {
    "./build/test_detail.xml".to_string()
}
pub(crate) fn default_unittest_cmd() -> String {
    "make test".to_string()
}
pub(crate) fn default_coverage_cmd() -> String {
    "make unit_test_coverage".to_string()
}
pub(crate) fn default_coverage_html_cmd() -> String {
    "make unit_test_coverage_html".to_string()
}
pub(crate) fn default_min_rate() -> u32 {
    100
}

/// Commands the build stage runs, in order, inside a fresh build folder.
pub fn default_build_commands() -> Vec<String> {
    vec!["cmake ..".to_string(), "make".to_string()]
}
