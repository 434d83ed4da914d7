pub fn greet(s: String) -> String {
    if let ::core::option::Option::Some(__mockexec_override) = ::mockexec::runtime::lookup("greet") {
        let mut __mockexec_res_0 = ::mockexec::runtime::Slot::<String>::empty();
        __mockexec_override.dispatch(
            ::std::vec![::mockexec::runtime::Value::new(s)],
            &mut [&mut __mockexec_res_0 as &mut dyn ::mockexec::runtime::ResultSlot],
        );
        return __mockexec_res_0.into_inner();
    }
    format!("hello {s}")
}

pub fn pair(s1: String, s2: String) -> (String, String) {
    if let ::core::option::Option::Some(__mockexec_override) = ::mockexec::runtime::lookup("pair") {
        let mut __mockexec_res_0 = ::mockexec::runtime::Slot::<String>::empty();
        let mut __mockexec_res_1 = ::mockexec::runtime::Slot::<String>::empty();
        __mockexec_override.dispatch(
            ::std::vec![::mockexec::runtime::Value::new(s1), ::mockexec::runtime::Value::new(s2)],
            &mut [
                &mut __mockexec_res_0 as &mut dyn ::mockexec::runtime::ResultSlot,
                &mut __mockexec_res_1 as &mut dyn ::mockexec::runtime::ResultSlot,
            ],
        );
        return (__mockexec_res_0.into_inner(), __mockexec_res_1.into_inner());
    }
    (format!("hello1 {s1}"), format!("hello2 {s2}"))
}

pub fn touch(log: std::sync::Arc<std::sync::Mutex<Vec<String>>>) {
    if let ::core::option::Option::Some(__mockexec_override) = ::mockexec::runtime::lookup("touch") {
        __mockexec_override.dispatch(::std::vec![::mockexec::runtime::Value::new(log)], &mut []);
        return;
    }
    log.lock().unwrap().push("original touch".to_string());
}

pub fn one(s: String) -> (String,) {
    if let ::core::option::Option::Some(__mockexec_override) = ::mockexec::runtime::lookup("one") {
        let mut __mockexec_res_0 = ::mockexec::runtime::Slot::<String>::empty();
        __mockexec_override.dispatch(
            ::std::vec![::mockexec::runtime::Value::new(s)],
            &mut [&mut __mockexec_res_0 as &mut dyn ::mockexec::runtime::ResultSlot],
        );
        return (__mockexec_res_0.into_inner(),);
    }
    (format!("hello {s}"),)
}
