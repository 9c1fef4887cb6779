//! Process creation with `posix_spawn(3)`
//!
//! The `envp` array is built from the [`EnvList`] entry by entry, so duplicate keys survive.

use std::ffi::{CString, OsStr, OsString};
use std::fs::File;
use std::os::fd::AsRawFd;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::ExitStatus;
use std::{iter, mem, ptr};

use log::debug;
use nix::errno::Errno;
use nix::sys::wait::{waitpid, WaitStatus};
use nix::unistd::Pid;

use super::{Stdio, Stream};
use crate::env::{EnvEntry, EnvList};
use crate::error::Error;

/// A null terminated array of C strings as expected for `argv` and `envp`
///
/// The pointers point into the heap buffers of the owned strings which don't move when the
/// vector holding them is moved.
struct CStringArray {
    _strings: Vec<CString>,
    pointers: Vec<*mut libc::c_char>,
}

/// An initialized `posix_spawn_file_actions_t` which is destroyed on drop
struct FileActions(libc::posix_spawn_file_actions_t);

impl CStringArray {
    fn new<'a, I>(items: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a OsStr>,
    {
        let strings = items
            .into_iter()
            .map(|item| {
                CString::new(item.as_bytes()).map_err(|_| {
                    Error::InvalidEntry(format!(
                        "'{}' contains an interior nul byte",
                        item.to_string_lossy().escape_debug()
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pointers = strings
            .iter()
            .map(|string| string.as_ptr().cast_mut())
            .chain(iter::once(ptr::null_mut()))
            .collect();

        Ok(Self {
            _strings: strings,
            pointers,
        })
    }

    fn as_ptr(&self) -> *const *mut libc::c_char {
        self.pointers.as_ptr()
    }
}

impl FileActions {
    fn new() -> Result<Self, Errno> {
        let mut actions = mem::MaybeUninit::<libc::posix_spawn_file_actions_t>::uninit();
        // SAFETY: `posix_spawn_file_actions_init` initializes the memory it is given
        let result = unsafe { libc::posix_spawn_file_actions_init(actions.as_mut_ptr()) };
        if result != 0 {
            return Err(Errno::from_raw(result));
        }
        // SAFETY: Initialized by `posix_spawn_file_actions_init` above
        Ok(Self(unsafe { actions.assume_init() }))
    }

    /// Let the child duplicate `file` onto the file descriptor of `stream`
    fn redirect(&mut self, file: &File, stream: Stream) -> Result<(), Errno> {
        // SAFETY: `self.0` is initialized and `file` outlives the `posix_spawn` call
        let result = unsafe {
            libc::posix_spawn_file_actions_adddup2(&mut self.0, file.as_raw_fd(), stream.fd())
        };
        if result == 0 {
            Ok(())
        } else {
            Err(Errno::from_raw(result))
        }
    }

    fn as_ptr(&self) -> *const libc::posix_spawn_file_actions_t {
        &self.0
    }
}

impl Drop for FileActions {
    fn drop(&mut self) {
        // SAFETY: `self.0` was initialized in `FileActions::new` and is destroyed only once
        unsafe {
            libc::posix_spawn_file_actions_destroy(&mut self.0);
        }
    }
}

/// Spawn `program` with `args` and exactly the entries of `env`, then wait for it to exit
pub(super) fn spawn_and_wait(
    program: &Path,
    args: &[OsString],
    env: &EnvList,
    redirections: [(&Stdio, Stream); 2],
) -> Result<ExitStatus, Error> {
    let launch_error = |message: String| Error::LaunchError(program.to_owned(), message);

    let path = CString::new(program.as_os_str().as_bytes())
        .map_err(|_| launch_error("The path contains an interior nul byte".to_owned()))?;
    let argv = CStringArray::new(
        iter::once(program.as_os_str()).chain(args.iter().map(OsString::as_os_str)),
    )?;
    let envp = CStringArray::new(env.iter().map(EnvEntry::as_os_str))?;

    let mut actions = FileActions::new()
        .map_err(|errno| launch_error(format!("posix_spawn_file_actions_init: {errno}")))?;

    // The files have to stay open until the child has been spawned
    let mut files = Vec::with_capacity(redirections.len());
    for (stdio, stream) in redirections {
        if let Some(file) = stdio.open(stream).map_err(launch_error)? {
            actions
                .redirect(&file, stream)
                .map_err(|errno| launch_error(format!("Failed to redirect {stream}: {errno}")))?;
            files.push(file);
        }
    }

    let mut pid: libc::pid_t = 0;
    // SAFETY: All pointers point to initialized, nul terminated data owned by this function which
    // lives until `posix_spawn` returns. A null `attrp` selects the default attributes.
    let result = unsafe {
        libc::posix_spawn(
            &mut pid,
            path.as_ptr(),
            actions.as_ptr(),
            ptr::null(),
            argv.as_ptr(),
            envp.as_ptr(),
        )
    };
    drop(files);

    if result != 0 {
        return Err(launch_error(Errno::from_raw(result).to_string()));
    }

    let pid = Pid::from_raw(pid);
    debug!("Spawned '{}' with pid {pid}", program.display());

    wait(pid)
}

/// Wait for `pid` to terminate and convert the result into an [`ExitStatus`]
fn wait(pid: Pid) -> Result<ExitStatus, Error> {
    loop {
        match waitpid(pid, None) {
            Ok(WaitStatus::Exited(_, code)) => {
                debug!("Process {pid} exited with code {code}");
                return Ok(ExitStatus::from_raw((code & 0xff) << 8));
            }
            Ok(WaitStatus::Signaled(_, signal, core_dumped)) => {
                debug!("Process {pid} was terminated by {signal}");
                let core_flag = if core_dumped { 0x80 } else { 0 };
                return Ok(ExitStatus::from_raw(signal as i32 | core_flag));
            }
            // Stopped or continued children are only reported with WUNTRACED or WCONTINUED
            Ok(_) | Err(Errno::EINTR) => {}
            Err(errno) => return Err(Error::WaitError(format!("waitpid({pid}): {errno}"))),
        }
    }
}
