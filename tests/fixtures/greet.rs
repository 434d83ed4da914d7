pub fn greet(s: String) -> String {
    format!("hello {s}")
}

pub fn pair(s1: String, s2: String) -> (String, String) {
    (format!("hello1 {s1}"), format!("hello2 {s2}"))
}

pub fn touch(log: std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
    log.lock().unwrap().push("original touch".to_string());
}

pub fn one(s: String) -> (String,) {
    (format!("hello {s}"),)
}
