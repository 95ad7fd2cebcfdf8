fn main() {
    #[cfg(feature = "cli")]
    oxilz::cli::run();

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("oxilz: CLI not enabled. Rebuild with `--features cli`.");
        std::process::exit(1);
    }
}
