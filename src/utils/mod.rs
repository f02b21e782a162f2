pub mod ansi;
pub mod editor;
pub mod highlight;
pub mod history;
pub mod logging;
#[cfg(test)]
pub mod test_utils;
pub mod url;
