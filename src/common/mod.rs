pub mod io;

/// Name used as the prefix of diagnostics, e.g. "futfconv" -> "utfconv".
#[inline]
pub fn tool_name(binary_name: &str) -> &str {
    binary_name.strip_prefix('f').unwrap_or(binary_name)
}

/// Let a closed output pipe end the process, as `head` downstream expects.
/// The Rust runtime ignores the signal, so call this before any output.
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Enlarge stdin/stdout pipe buffers on Linux so each chunk moves in fewer
/// syscalls. Falls back to smaller sizes when the system limit is lower.
#[cfg(target_os = "linux")]
pub fn enlarge_pipes() {
    for &fd in &[0i32, 1] {
        for &size in &[8 * 1024 * 1024i32, 1024 * 1024, 256 * 1024] {
            if unsafe { libc::fcntl(fd, libc::F_SETPIPE_SZ, size) } > 0 {
                break;
            }
        }
    }
}

/// Message for `e` as shown after "utfconv: FILE: ", minus the errno tag.
pub fn io_error_msg(e: &std::io::Error) -> String {
    if let Some(raw) = e.raw_os_error() {
        let os_err = std::io::Error::from_raw_os_error(raw);
        let msg = format!("{}", os_err);
        msg.replace(&format!(" (os error {})", raw), "")
    } else {
        format!("{}", e)
    }
}
