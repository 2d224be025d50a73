fn main() {
    // The ESP-IDF environment only exists when cross-compiling for the watch.
    // Host builds (replay tool, tests) skip it entirely.
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("espidf") {
        embuild::espidf::sysenv::output();
    }
}
