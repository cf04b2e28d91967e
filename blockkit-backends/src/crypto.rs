// SPDX-License-Identifier: GPL-3.0-only

//! LUKS backend (cryptsetup)
//!
//! Passphrases travel over the tool's stdin, never over the command line
//! and never through temporary files.

use std::fs;
use std::thread;
use std::time::Duration;

use blockkit_contracts::traits::{CryptoOps, CryptoTech};
use blockkit_contracts::{
    Backend, Error, ErrorDomain, ErrorKind, ExtraArg, Result, TechModes,
};
use blockkit_sys::dep::{ToolSpec, check_tool, tool_version};
use blockkit_sys::exec::{run_tool_with_input, splice_args};
use blockkit_sys::log;
use blockkit_types::BackendId;

const DOMAIN: ErrorDomain = ErrorDomain::Crypto;

const ENTROPY_AVAIL: &str = "/proc/sys/kernel/random/entropy_avail";
const ENTROPY_POLL: Duration = Duration::from_millis(500);

pub struct CryptoBackend;

impl CryptoBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CryptoBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn require_passphrase(passphrase: &str) -> Result<()> {
    if passphrase.is_empty() {
        return Err(Error::new(DOMAIN, ErrorKind::NoKey, "No passphrase given"));
    }
    Ok(())
}

/// Block until the kernel entropy pool reports at least `min_entropy`
/// bits. May block indefinitely on an entropy-starved system.
fn wait_for_entropy(min_entropy: u32) {
    loop {
        let available: u32 = fs::read_to_string(ENTROPY_AVAIL)
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(u32::MAX);
        if available >= min_entropy {
            return;
        }
        log::info(&format!(
            "Waiting for entropy: {available}/{min_entropy} bits available"
        ));
        thread::sleep(ENTROPY_POLL);
    }
}

impl Backend for CryptoBackend {
    fn id(&self) -> BackendId {
        BackendId::Crypto
    }

    fn probe_dependencies(&self) -> Result<()> {
        if !cfg!(feature = "crypto-tools") {
            return Err(Error::new(
                DOMAIN,
                ErrorKind::TechUnavail,
                "Built without crypto-tools support",
            ));
        }
        check_tool(DOMAIN, ToolSpec::with_version("cryptsetup", "--version", "1.7"))
    }

    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn shutdown(&self) {}

    fn is_tech_available(&self, tech: u32, _modes: TechModes) -> Result<()> {
        match CryptoTech::from_raw(tech) {
            Some(CryptoTech::Luks) => Ok(()),
            Some(CryptoTech::Luks2) => {
                // LUKS2 arrived in cryptsetup 2.0; the version was cached
                // by the dependency probe
                match tool_version("cryptsetup") {
                    Some(version) if !version.starts_with("1.") => Ok(()),
                    _ => Err(Error::new(
                        DOMAIN,
                        ErrorKind::TechUnavail,
                        "LUKS2 requires cryptsetup >= 2.0",
                    )),
                }
            }
            None => Err(Error::new(
                DOMAIN,
                ErrorKind::Inval,
                format!("Invalid crypto technology: {tech}"),
            )),
        }
    }

    fn as_crypto(&self) -> Option<&dyn CryptoOps> {
        Some(self)
    }
}

impl CryptoOps for CryptoBackend {
    fn luks_format(
        &self,
        device: &str,
        cipher: Option<&str>,
        key_size: u32,
        passphrase: &str,
        min_entropy: u32,
        extra: &[ExtraArg],
    ) -> Result<()> {
        require_passphrase(passphrase)?;
        if min_entropy > 0 {
            wait_for_entropy(min_entropy);
        }

        let mut base: Vec<&str> = vec![
            "cryptsetup",
            "luksFormat",
            "--batch-mode",
            "--key-file=-",
        ];
        if let Some(cipher) = cipher {
            base.push("--cipher");
            base.push(cipher);
        }
        let key_size_arg = key_size.to_string();
        if key_size > 0 {
            base.push("--key-size");
            base.push(&key_size_arg);
        }

        let argv = splice_args(&base, extra, &[device]);
        run_tool_with_input(DOMAIN, &argv, passphrase)
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::FormatFailed, err.message))
    }

    fn luks_open(&self, device: &str, name: &str, passphrase: &str, read_only: bool) -> Result<()> {
        require_passphrase(passphrase)?;

        let mut argv: Vec<&str> = vec!["cryptsetup", "open", "--type", "luks", "--key-file=-"];
        if read_only {
            argv.push("--readonly");
        }
        argv.push(device);
        argv.push(name);

        run_tool_with_input(DOMAIN, &argv, passphrase)
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::Device, err.message))
    }

    fn luks_close(&self, name: &str) -> Result<()> {
        run_tool_with_input(DOMAIN, &["cryptsetup", "close", name], "")
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::Device, err.message))
    }

    fn luks_add_key(&self, device: &str, passphrase: &str, new_passphrase: &str) -> Result<()> {
        require_passphrase(passphrase)?;
        require_passphrase(new_passphrase)?;

        // non-interactive: existing passphrase on the first stdin line,
        // the new one on the second
        let input = format!("{passphrase}\n{new_passphrase}\n");
        run_tool_with_input(DOMAIN, &["cryptsetup", "luksAddKey", device], &input)
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::AddKey, err.message))
    }

    fn luks_remove_key(&self, device: &str, passphrase: &str) -> Result<()> {
        require_passphrase(passphrase)?;

        run_tool_with_input(
            DOMAIN,
            &["cryptsetup", "luksRemoveKey", device, "--key-file=-"],
            passphrase,
        )
        .map(|_| ())
        .map_err(|err| Error::new(DOMAIN, ErrorKind::RemoveKey, err.message))
    }

    fn luks_resize(&self, name: &str, size: u64) -> Result<()> {
        let size_arg = size.to_string();
        let mut argv: Vec<&str> = vec!["cryptsetup", "resize"];
        if size > 0 {
            argv.push("--size");
            argv.push(&size_arg);
        }
        argv.push(name);

        run_tool_with_input(DOMAIN, &argv, "")
            .map(|_| ())
            .map_err(|err| Error::new(DOMAIN, ErrorKind::ResizeFailed, err.message))
    }

    fn is_luks(&self, device: &str) -> Result<bool> {
        // isLuks answers through its exit status; non-zero is "no"
        Ok(run_tool_with_input(DOMAIN, &["cryptsetup", "isLuks", device], "").is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_passphrases_are_rejected_before_any_tool_runs() {
        let backend = CryptoBackend::new();

        let err = backend
            .luks_format("/dev/null", None, 0, "", 0, &[])
            .expect_err("empty passphrase");
        assert_eq!(err.kind, ErrorKind::NoKey);

        let err = backend
            .luks_add_key("/dev/null", "old", "")
            .expect_err("empty new passphrase");
        assert_eq!(err.kind, ErrorKind::NoKey);
    }
}
