//! Version command handler

/// Display version information
pub fn display_version() {
    println!("dsctl {}", env!("CARGO_PKG_VERSION"));
    println!("  {}", env!("CARGO_PKG_DESCRIPTION"));
    println!("  License: {}", env!("CARGO_PKG_LICENSE"));
    println!(
        "  TLS backend: {}",
        if cfg!(feature = "native-tls") {
            "native-tls"
        } else {
            "rustls"
        }
    );
}
