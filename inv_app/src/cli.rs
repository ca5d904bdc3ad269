/// Positional command-line argument `index` (1-based), skipping `--flags`
pub fn arg(index: usize) -> Option<String> {
    std::env::args().skip(1).filter(|arg| !arg.starts_with("--")).nth(index.checked_sub(1)?)
}

/// Positional argument `index`, or `default` when absent
pub fn arg_or(index: usize, default: &str) -> String {
    arg(index).unwrap_or_else(|| default.to_string())
}

/// True when `flag` appears anywhere after the program name
pub fn has_flag(flag: &str) -> bool {
    std::env::args().skip(1).any(|arg| arg == flag)
}
