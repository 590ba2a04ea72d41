pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter("debug,kindling_ui=trace,kindling_text=trace")
        .init();
}
