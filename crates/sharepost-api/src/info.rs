pub async fn handle_info() -> String {
    format!("Installed SharePost v{}", env!("CARGO_PKG_VERSION"))
}
