/// Current wall-clock time as Unix seconds.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
