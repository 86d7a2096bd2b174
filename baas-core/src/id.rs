use rand::{Rng, distr::Alphanumeric};

const OBJECT_ID_LEN: usize = 10;

/// Random alphanumeric identifier used for stored objects and push jobs.
pub fn new_object_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(OBJECT_ID_LEN)
        .map(char::from)
        .collect()
}

/// Prefix that keeps uploaded file names unique.
pub fn new_file_prefix() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
