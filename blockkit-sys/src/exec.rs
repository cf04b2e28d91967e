// SPDX-License-Identifier: GPL-3.0-only

//! Subprocess execution
//!
//! All backends drive their external tools through [`run_tool`]: the
//! invocation is logged, stdout/stderr are captured, and a non-zero exit
//! becomes a `Fail` in the caller's domain with the captured stderr as the
//! diagnostic. [`run_tool_with_extra`] additionally splices caller
//! pass-through arguments between the backend's own arguments and the
//! positional device arguments, preserving input order.

use std::io::Write;
use std::process::{Command, Stdio};

use blockkit_contracts::{Error, ErrorDomain, ErrorKind, ExtraArg, Result};

use crate::log;

/// Run `argv[0]` with `argv[1..]`, returning captured stdout.
pub fn run_tool(domain: ErrorDomain, argv: &[&str]) -> Result<String> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        Error::new(domain, ErrorKind::Inval, "Empty command line".to_string())
    })?;

    log::debug(&format!("Running: {}", argv.join(" ")));

    let output = Command::new(program).args(args).output().map_err(|err| {
        Error::new(
            domain,
            ErrorKind::Fail,
            format!("Failed to execute '{program}': {err}"),
        )
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(Error::new(
            domain,
            ErrorKind::Fail,
            format!(
                "Process '{program}' exited with status {}: {stderr}",
                output
                    .status
                    .code()
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
            ),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Run `argv` feeding `input` to the tool's stdin (passphrases, table
/// scripts). Captured-output semantics match [`run_tool`]; the input is
/// never logged.
pub fn run_tool_with_input(domain: ErrorDomain, argv: &[&str], input: &str) -> Result<String> {
    let (program, args) = argv.split_first().ok_or_else(|| {
        Error::new(domain, ErrorKind::Inval, "Empty command line".to_string())
    })?;

    log::debug(&format!("Running (with input): {}", argv.join(" ")));

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| {
            Error::new(
                domain,
                ErrorKind::Fail,
                format!("Failed to execute '{program}': {err}"),
            )
        })?;

    if let Some(stdin) = child.stdin.as_mut()
        && let Err(err) = stdin.write_all(input.as_bytes())
    {
        let _ = child.kill();
        return Err(Error::new(
            domain,
            ErrorKind::Fail,
            format!("Failed to write input to '{program}': {err}"),
        ));
    }
    drop(child.stdin.take());

    let output = child.wait_with_output().map_err(|err| {
        Error::new(
            domain,
            ErrorKind::Fail,
            format!("Failed to wait for '{program}': {err}"),
        )
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        return Err(Error::new(
            domain,
            ErrorKind::Fail,
            format!(
                "Process '{program}' exited with status {}: {stderr}",
                output
                    .status
                    .code()
                    .map(|code| code.to_string())
                    .unwrap_or_else(|| "signal".to_string()),
            ),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Splice pass-through arguments between a backend's own arguments and
/// the positional device arguments, preserving input order. A pair with
/// an empty value contributes only its option.
pub fn splice_args<'a>(
    base: &[&'a str],
    extra: &'a [ExtraArg],
    positional: &[&'a str],
) -> Vec<&'a str> {
    let mut argv: Vec<&str> = Vec::with_capacity(base.len() + extra.len() * 2 + positional.len());
    argv.extend_from_slice(base);
    for arg in extra {
        argv.push(&arg.opt);
        if !arg.val.is_empty() {
            argv.push(&arg.val);
        }
    }
    argv.extend_from_slice(positional);
    argv
}

/// Run a tool as `base + extra + positional`.
pub fn run_tool_with_extra(
    domain: ErrorDomain,
    base: &[&str],
    extra: &[ExtraArg],
    positional: &[&str],
) -> Result<String> {
    run_tool(domain, &splice_args(base, extra, positional))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_stdout() {
        let out = run_tool(ErrorDomain::Utils, &["echo", "hello"]).expect("echo runs");
        assert_eq!(out.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_surfaces_stderr() {
        let err = run_tool(ErrorDomain::Swap, &["sh", "-c", "echo broken >&2; exit 3"])
            .expect_err("non-zero exit");
        assert_eq!(err.domain, ErrorDomain::Swap);
        assert_eq!(err.kind, ErrorKind::Fail);
        assert!(err.message.contains("status 3"));
        assert!(err.message.contains("broken"));
    }

    #[test]
    fn missing_binary_fails_in_domain() {
        let err = run_tool(ErrorDomain::Fs, &["/no/such/tool-477"]).expect_err("spawn failure");
        assert_eq!(err.domain, ErrorDomain::Fs);
        assert_eq!(err.kind, ErrorKind::Fail);
    }

    #[test]
    fn input_reaches_stdin() {
        let out = run_tool_with_input(ErrorDomain::Utils, &["cat"], "piped secret\n")
            .expect("cat runs");
        assert_eq!(out, "piped secret\n");
    }

    #[test]
    fn extra_args_keep_order_between_base_and_positional() {
        let extra = [
            ExtraArg::new("--one", "1"),
            ExtraArg::new("--flag", ""),
            ExtraArg::new("--two", "2"),
        ];
        let out = run_tool_with_extra(
            ErrorDomain::Utils,
            &["echo", "base"],
            &extra,
            &["/dev/positional"],
        )
        .expect("echo runs");
        assert_eq!(out.trim(), "base --one 1 --flag --two 2 /dev/positional");
    }
}
