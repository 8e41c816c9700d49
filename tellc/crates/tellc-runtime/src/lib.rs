//! Tell runtime library.
//!
//! The externs the emitted assembly links against: `show_num`, `show_str`,
//! `process_exit`, and `ask_str`. Strings cross the boundary as pointers
//! to NUL-terminated bytes; ownership of an `ask_str` result stays with
//! the runtime (the emitted code only ever reads it).

use std::io::{BufRead, Write};

use libc::c_char;

/// Prints a signed 64-bit value in decimal, followed by a newline.
#[no_mangle]
pub extern "C" fn show_num(value: i64) {
    println!("{}", value);
}

/// Prints a NUL-terminated string followed by a newline. A null pointer
/// prints `null`.
///
/// # Safety
///
/// `s`, when non-null, must point to a NUL-terminated byte sequence that
/// stays valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn show_str(s: *const c_char) {
    if s.is_null() {
        println!("null");
        return;
    }
    let bytes = std::ffi::CStr::from_ptr(s).to_bytes();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let _ = out.write_all(bytes);
    let _ = out.write_all(b"\n");
    let _ = out.flush();
}

/// Terminates the process with the given exit code.
#[no_mangle]
pub extern "C" fn process_exit(code: i32) -> ! {
    std::process::exit(code);
}

/// Prints the prompt (when non-null, with no trailing newline), reads one
/// line from stdin, and returns a heap copy of it without the line
/// terminator. Returns null on EOF or read failure. The returned buffer
/// stays owned by the runtime for the lifetime of the process.
///
/// # Safety
///
/// `prompt`, when non-null, must point to a NUL-terminated byte sequence
/// that stays valid for the duration of the call.
#[no_mangle]
pub unsafe extern "C" fn ask_str(prompt: *const c_char) -> *mut c_char {
    if !prompt.is_null() {
        let bytes = std::ffi::CStr::from_ptr(prompt).to_bytes();
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let _ = out.write_all(bytes);
        let _ = out.flush();
    }

    let mut line = String::new();
    let stdin = std::io::stdin();
    match stdin.lock().read_line(&mut line) {
        Ok(0) | Err(_) => return std::ptr::null_mut(),
        Ok(_) => {}
    }

    while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
    }

    match std::ffi::CString::new(line) {
        // The emitted program never frees; leaking keeps the pointer
        // valid for its whole run.
        Ok(cstring) => cstring.into_raw(),
        Err(_) => std::ptr::null_mut(),
    }
}
