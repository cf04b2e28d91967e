// SPDX-License-Identifier: GPL-3.0-only

//! Partition scenarios end to end: façade dispatch into the engine over
//! the in-memory table I/O.

use std::sync::{Arc, LazyLock, Once};

use blockkit::{BackendId, PartAlign, PartFlag, PartTypeFlag, PartTypeReq, TableType};
use blockkit_testing::{MemTableIo, force_all_stubs, register_mem_part_image};

const MIB: u64 = 1024 * 1024;

static MACHINE: LazyLock<Arc<MemTableIo>> = LazyLock::new(MemTableIo::new);
static INIT: Once = Once::new();

/// Initialize the façade once: stubs everywhere, the partition backend
/// over the shared in-memory machine.
fn init_machine() -> Arc<MemTableIo> {
    INIT.call_once(|| {
        blockkit_testing::init_tracing();
        register_mem_part_image("it_part_mem", &MACHINE);
        let mut force = force_all_stubs("it_part");
        for spec in &mut force {
            if spec.id == BackendId::Part {
                spec.image = Some("it_part_mem".to_string());
            }
        }
        blockkit::init(&force, None).expect("façade initializes");
    });
    Arc::clone(&MACHINE)
}

fn add_disk(io: &MemTableIo, device: &str) {
    // 1 GiB, 512-byte sectors
    io.add_disk(device, 512, 2 * 1024 * 1024);
}

#[test]
fn existing_table_survives_a_refused_overwrite() {
    let io = init_machine();
    add_disk(&io, "/dev/it0");

    blockkit::part::create_table("/dev/it0", TableType::Gpt, false).expect("seed GPT");
    blockkit::part::create_part("/dev/it0", PartTypeReq::Normal, MIB, 16 * MIB, PartAlign::Optimal)
        .expect("seed partition");

    let err = blockkit::part::create_table("/dev/it0", TableType::Mbr, false)
        .expect_err("device already has a table");
    assert_eq!(err.kind, blockkit::ErrorKind::Exists);

    assert_eq!(io.table_type("/dev/it0"), Some(TableType::Gpt));
    assert_eq!(blockkit::part::get_disk_parts("/dev/it0").expect("listing").len(), 1);
}

#[test]
fn auto_type_placement_inside_extended() {
    let io = init_machine();
    add_disk(&io, "/dev/it1");

    blockkit::part::create_table("/dev/it1", TableType::Mbr, false).expect("fresh MBR");
    for start in [1, 101, 201] {
        blockkit::part::create_part(
            "/dev/it1",
            PartTypeReq::Normal,
            start * MIB,
            50 * MIB,
            PartAlign::Optimal,
        )
        .expect("primary");
    }
    let ext = blockkit::part::create_part(
        "/dev/it1",
        PartTypeReq::Extended,
        301 * MIB,
        0,
        PartAlign::Optimal,
    )
    .expect("extended over the tail");

    let spec = blockkit::part::create_part(
        "/dev/it1",
        PartTypeReq::Next,
        ext.start + 512,
        64 * MIB,
        PartAlign::Optimal,
    )
    .expect("auto-typed partition");

    assert!(spec.type_flags.contains(PartTypeFlag::Logical));
    assert!(spec.start >= ext.start + MIB);
    assert_eq!(spec.start % 512, 0);
}

#[test]
fn boot_flag_round_trips_as_bit_one() {
    let io = init_machine();
    add_disk(&io, "/dev/it2");

    blockkit::part::create_table("/dev/it2", TableType::Mbr, false).expect("fresh MBR");
    let part = blockkit::part::create_part(
        "/dev/it2",
        PartTypeReq::Normal,
        MIB,
        32 * MIB,
        PartAlign::Optimal,
    )
    .expect("partition");

    blockkit::part::set_part_flag("/dev/it2", &part.path, PartFlag::Boot, true)
        .expect("boot flag");

    let spec = blockkit::part::get_part_spec("/dev/it2", &part.path).expect("spec");
    assert_eq!(PartFlag::Boot as u32, 1 << 1);
    assert!(spec.flags.contains(PartFlag::Boot));
    assert!(!spec.flags.contains(PartFlag::Root));
}

#[test]
fn os_inform_failure_is_reported_with_its_phase() {
    let io = init_machine();
    add_disk(&io, "/dev/it3");

    blockkit::part::create_table("/dev/it3", TableType::Gpt, false).expect("fresh GPT");
    io.fail_commit_os("/dev/it3", true);

    let err = blockkit::part::create_part(
        "/dev/it3",
        PartTypeReq::Normal,
        MIB,
        32 * MIB,
        PartAlign::Optimal,
    )
    .expect_err("busy device");

    assert_eq!(err.kind, blockkit::ErrorKind::Fail);
    assert!(
        err.message
            .contains("Failed to inform OS about changes on the '/dev/it3' device"),
        "unexpected message: {}",
        err.message
    );
}

#[test]
fn pure_lookups_do_not_need_the_backend() {
    assert_eq!(
        blockkit::part::table_type_to_string(TableType::Mbr).expect("msdos"),
        "msdos"
    );
    assert_eq!(blockkit::part::flag_to_string(PartFlag::Esp), "esp");
}
