pub mod io;

/// Reset SIGPIPE to default behavior (SIG_DFL) so a closed pipe ends the
/// process quietly like other filters do. Rust sets SIGPIPE to SIG_IGN by
/// default. Call this at the start of main().
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Format an IO error message without the "(os error N)" suffix that Rust's
/// Display impl appends, e.g. "No such file or directory".
pub fn io_error_msg(e: &std::io::Error) -> String {
    let msg = e.to_string();
    match e.raw_os_error() {
        Some(code) => msg
            .strip_suffix(&format!(" (os error {code})"))
            .map(str::to_owned)
            .unwrap_or(msg),
        None => msg,
    }
}
