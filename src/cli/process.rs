use std::path::PathBuf;

use anyhow::Result;

use super::daemon_path::to_daemon_path;

/// Spawns the daemon executable detached from the current console. There is
/// no need to hunt down a previous instance first: the daemon holds an
/// exclusive lock on its directory, so a duplicate exits on its own.
pub fn start_server(dir: PathBuf) -> Result<()> {
    // The daemon executable is expected next to the cli one. It's not the
    // best option but it will do the job in most cases.
    let process_name = to_daemon_path(std::env::current_exe()?);
    let mut command = std::process::Command::new(process_name);
    command.arg("--force");
    command.arg("--dir");
    command.arg(dir);

    #[cfg(feature = "win")]
    {
        use std::os::windows::process::CommandExt;
        use windows::Win32::System::Threading::DETACHED_PROCESS;
        command.creation_flags(DETACHED_PROCESS.0);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        use std::process::Stdio;
        command.process_group(0);
        command.stdin(Stdio::null());
        command.stdout(Stdio::null());
        command.stderr(Stdio::null());
    }

    println!("Spawning");
    #[allow(clippy::zombie_processes)]
    let _ = command.spawn()?;
    println!("Success");
    Ok(())
}
