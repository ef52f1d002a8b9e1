fn main() {
    // Embed the application icon on Windows
    #[cfg(target_os = "windows")]
    {
        if std::path::Path::new("assets/icon.ico").exists() {
            let mut res = winres::WindowsResource::new();
            res.set_icon("assets/icon.ico");

            if let Err(e) = res.compile() {
                eprintln!("Warning: Failed to embed icon: {}", e);
            }
        }
    }
}
