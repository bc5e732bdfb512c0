//! Version command handler

/// Display version information
pub fn display_version() {
    println!("kubegraph {}", env!("CARGO_PKG_VERSION"));
    println!("  {}", env!("CARGO_PKG_DESCRIPTION"));
    println!("  License: {}", env!("CARGO_PKG_LICENSE"));
    let repository = env!("CARGO_PKG_REPOSITORY");
    if !repository.is_empty() {
        println!("  Repository: {}", repository);
    }
}
