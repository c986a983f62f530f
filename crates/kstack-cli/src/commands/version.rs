//! Version command

/// Version line, with build metadata when it was provided at compile time
pub fn version_line() -> String {
    let mut line = format!("kstack {}", env!("CARGO_PKG_VERSION"));
    if let Some(commit) = option_env!("KSTACK_COMMIT").filter(|c| !c.is_empty()) {
        line.push_str(&format!(" (commit {commit})"));
    }
    if let Some(date) = option_env!("KSTACK_BUILD_DATE").filter(|d| !d.is_empty()) {
        line.push_str(&format!(" built {date}"));
    }
    line
}

pub fn run() {
    println!("{}", version_line());
}
