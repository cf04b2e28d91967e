// SPDX-License-Identifier: GPL-3.0-only

//! Block-device topology from sysfs
//!
//! The partition engine derives its alignment grains from the queue
//! limits the kernel exports under `/sys/class/block/<dev>/queue`. Values
//! the kernel reports as zero (common on loop devices and VMs) fall back
//! to the 1 MiB convention.

use std::fs;
use std::path::{Path, PathBuf};

/// Queue limits of one block device, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockTopology {
    pub logical_sector_size: u64,
    pub minimum_io_size: u64,
    pub optimal_io_size: u64,
    pub alignment_offset: u64,
}

/// Default grain used when the kernel reports no I/O size hints.
pub const DEFAULT_GRAIN_BYTES: u64 = 1024 * 1024;

impl BlockTopology {
    /// Grain for minimal alignment: the minimum I/O size, or one sector.
    pub fn minimal_grain(&self) -> u64 {
        if self.minimum_io_size > 0 {
            self.minimum_io_size
        } else {
            self.logical_sector_size
        }
    }

    /// Grain for optimal alignment: the optimal I/O size, or the 1 MiB
    /// default when the kernel gives no hint.
    pub fn optimal_grain(&self) -> u64 {
        if self.optimal_io_size > 0 {
            self.optimal_io_size
        } else {
            DEFAULT_GRAIN_BYTES
        }
    }
}

impl Default for BlockTopology {
    fn default() -> Self {
        Self {
            logical_sector_size: 512,
            minimum_io_size: 512,
            optimal_io_size: 0,
            alignment_offset: 0,
        }
    }
}

/// Kernel name of a device ("/dev/sda" → "sda").
pub fn kernel_name(device: &str) -> &str {
    device.rsplit('/').next().unwrap_or(device)
}

fn sysfs_dir(device: &str) -> PathBuf {
    Path::new("/sys/class/block").join(kernel_name(device))
}

fn read_u64(path: &Path) -> Option<u64> {
    fs::read_to_string(path)
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
}

/// Topology of `device` from sysfs; missing attributes keep defaults.
pub fn read_topology(device: &str) -> BlockTopology {
    let queue = sysfs_dir(device).join("queue");
    let mut topology = BlockTopology::default();

    if let Some(value) = read_u64(&queue.join("logical_block_size")) {
        if value > 0 {
            topology.logical_sector_size = value;
        }
    }
    if let Some(value) = read_u64(&queue.join("minimum_io_size")) {
        topology.minimum_io_size = value;
    }
    if let Some(value) = read_u64(&queue.join("optimal_io_size")) {
        topology.optimal_io_size = value;
    }
    if let Some(value) = read_u64(&sysfs_dir(device).join("alignment_offset")) {
        topology.alignment_offset = value;
    }

    topology
}

/// Device length in bytes from the sysfs `size` attribute (512-byte
/// units), when the device exists.
pub fn device_size_bytes(device: &str) -> Option<u64> {
    read_u64(&sysfs_dir(device).join("size")).map(|sectors| sectors * 512)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_name_strips_dev_prefix() {
        assert_eq!(kernel_name("/dev/sda"), "sda");
        assert_eq!(kernel_name("/dev/mapper/cr_root"), "cr_root");
        assert_eq!(kernel_name("sdb"), "sdb");
    }

    #[test]
    fn grains_fall_back_when_kernel_reports_zero() {
        let topology = BlockTopology {
            logical_sector_size: 512,
            minimum_io_size: 0,
            optimal_io_size: 0,
            alignment_offset: 0,
        };
        assert_eq!(topology.minimal_grain(), 512);
        assert_eq!(topology.optimal_grain(), DEFAULT_GRAIN_BYTES);

        let topology = BlockTopology {
            logical_sector_size: 512,
            minimum_io_size: 4096,
            optimal_io_size: 1024 * 1024,
            alignment_offset: 0,
        };
        assert_eq!(topology.minimal_grain(), 4096);
        assert_eq!(topology.optimal_grain(), 1024 * 1024);
    }
}
