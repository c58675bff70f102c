// src/exec/shell.rs

//! Shell command construction and small parsing helpers shared by the
//! validator and notifier processes.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

/// Build a shell command for `cmd`, passing `args` as positional arguments.
///
/// On Unix the arguments reach the command through `"$@"`, so paths with
/// spaces survive intact: `sh -c '<cmd> "$@"' sitepipe <args...>`.
pub fn shell_command(cmd: &str, args: &[String]) -> Command {
    let mut command = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd).args(args);
        c
    } else {
        let mut c = Command::new("sh");
        if args.is_empty() {
            c.arg("-c").arg(cmd);
        } else {
            c.arg("-c").arg(format!("{cmd} \"$@\"")).arg("sitepipe").args(args);
        }
        c
    };

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    command
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
