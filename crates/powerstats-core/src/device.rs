//! Static wiring tables for a representative SoC.
//!
//! Paths, headers and prefixes are configuration data. Every path is joined
//! onto `root`, so the same tables read a live device (`root = "/"`) or a
//! captured copy of its sysfs tree.

use std::path::{Path, PathBuf};

use crate::collector::traits::FileSystem;
use crate::residency::{
    AOC_CLOCK, AocStateResidencyProvider, CpupmSleepConfig, CpupmStateResidencyProvider,
    DevfreqStateResidencyProvider, DvfsDomain, DvfsStateResidencyProvider, NS_TO_MS,
    PowerEntityConfig, PowerStats, SourcePath, StateResidencyTemplate, TICK_TO_MS,
    TpuDvfsStateResidencyProvider, Transform, US_TO_MS, UfsStateResidencyProvider,
    generate_state_residency_configs,
};

/// Number of i2c bus indices searched for the NFC controller.
const NFC_I2C_BUSES: usize = 10;

const AOC_BASE: &str = "/sys/devices/platform/17000000.aoc/";
const ACPM_STATS: &str = "/sys/devices/platform/acpm_stats/";

fn at(root: &Path, path: &str) -> PathBuf {
    root.join(path.trim_start_matches('/'))
}

/// Builds a registry with every provider of the device.
pub fn build<F: FileSystem + Clone + 'static>(fs: F, root: &Path) -> PowerStats {
    let mut stats = PowerStats::new();

    add_aoc(&mut stats, &fs, root);
    add_cpu_clusters(&mut stats, &fs, root);
    add_soc(&mut stats, &fs, root);
    add_gnss(&mut stats, &fs, root);
    add_mobile_radio(&mut stats, &fs, root);
    add_nfc(&mut stats, &fs, root);
    add_pcie(&mut stats, &fs, root);
    add_wifi(&mut stats, &fs, root);
    add_tpu(&mut stats, &fs, root);
    add_ufs(&mut stats, &fs, root);
    add_power_domains(&mut stats, &fs, root);
    add_dvfs(&mut stats, &fs, root);
    add_devfreq(&mut stats, &fs, root);

    stats
}

fn add_aoc<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let control = |name: &str| {
        at(root, &format!("{AOC_BASE}control/{name}"))
            .display()
            .to_string()
    };

    let cores = [
        ("AoC-A32", control("a32_")),
        ("AoC-FF1", control("ff1_")),
        ("AoC-HF1", control("hf1_")),
        ("AoC-HF0", control("hf0_")),
    ];
    let core_states = [("DWN", "off"), ("RET", "retention"), ("WFI", "wfi")];
    stats.add_provider(Box::new(AocStateResidencyProvider::new(
        fs.clone(),
        &cores,
        &core_states,
        AOC_CLOCK,
    )));

    let voltage = [("AoC-Voltage", control("voltage_"))];
    let voltage_states = [
        ("NOM", "nominal"),
        ("SUD", "super_underdrive"),
        ("UUD", "ultra_underdrive"),
        ("UD", "underdrive"),
    ];
    stats.add_provider(Box::new(AocStateResidencyProvider::new(
        fs.clone(),
        &voltage,
        &voltage_states,
        AOC_CLOCK,
    )));

    let monitor = [("AoC", control("monitor_"))];
    stats.add_provider(Box::new(AocStateResidencyProvider::new(
        fs.clone(),
        &monitor,
        &[("MON", "mode")],
        AOC_CLOCK,
    )));

    // restart_count holds a bare number
    let restart = StateResidencyTemplate::new().entry_count("");
    stats.add_generic(
        fs.clone(),
        SourcePath::fixed(at(root, &format!("{AOC_BASE}restart_count"))),
        vec![PowerEntityConfig::new(
            "AoC-Count",
            "",
            generate_state_residency_configs(&restart, &[("RESTART", "")]),
        )],
    );
}

fn add_cpu_clusters<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let template = StateResidencyTemplate::new()
        .entry_count("down_count:")
        .total_time("total_down_time_ns:", Transform::DivideBy(NS_TO_MS))
        .last_entry("last_down_time_ns:", Transform::DivideBy(NS_TO_MS));

    let entities = ["CLUSTER0", "CLUSTER1", "CLUSTER2"]
        .into_iter()
        .map(|name| {
            PowerEntityConfig::new(
                name,
                name,
                generate_state_residency_configs(&template, &[("DOWN", "")]),
            )
        })
        .collect();

    stats.add_generic(
        fs.clone(),
        SourcePath::fixed(at(root, &format!("{ACPM_STATS}core_stats"))),
        entities,
    );

    let cpus = [
        ("CPU0", "cpu0"),
        ("CPU1", "cpu1"),
        ("CPU2", "cpu2"),
        ("CPU3", "cpu3"),
        ("CPU4", "cpu4"),
        ("CPU5", "cpu5"),
        ("CPU6", "cpu6"),
        ("CPU7", "cpu7"),
        ("CPU8", "cpu8"),
    ];
    let sleep = CpupmSleepConfig {
        path: at(root, &format!("{ACPM_STATS}soc_stats")),
        header: "LPM:".to_string(),
        state: "SLEEP".to_string(),
        time_prefix: "total_time_ns:".to_string(),
    };
    stats.add_provider(Box::new(CpupmStateResidencyProvider::new(
        fs.clone(),
        at(root, "/sys/devices/system/cpu/cpupm/cpupm/time_in_state"),
        &cpus,
        &[("DOWN", "[state1]")],
        Some(sleep),
    )));
}

fn add_soc<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let lpm = StateResidencyTemplate::new()
        .entry_count("success_count:")
        .total_time("total_time_ns:", Transform::DivideBy(NS_TO_MS))
        .last_entry("last_entry_time_ns:", Transform::DivideBy(NS_TO_MS));
    let down = StateResidencyTemplate::new()
        .entry_count("down_count:")
        .total_time("total_down_time_ns:", Transform::DivideBy(NS_TO_MS))
        .last_entry("last_down_time_ns:", Transform::DivideBy(NS_TO_MS));
    let req = StateResidencyTemplate::new()
        .entry_count("req_up_count:")
        .total_time("total_req_up_time_ns:", Transform::DivideBy(NS_TO_MS))
        .last_entry("last_req_up_time_ns:", Transform::DivideBy(NS_TO_MS));

    let power_states = [
        ("SICD", "SICD"),
        ("SLEEP", "SLEEP"),
        ("SLEEP_SLCMON", "SLEEP_SLCMON"),
        ("SLEEP_HSI1ON", "SLEEP_HSI1ON"),
        ("STOP", "STOP"),
    ];
    let mif_req_states = [("AOC", "AOC"), ("GSA", "GSA"), ("TPU", "TPU"), ("AUR", "AUR")];
    let slc_req_states = [("AOC", "AOC")];

    let entities = vec![
        PowerEntityConfig::new(
            "LPM",
            "LPM:",
            generate_state_residency_configs(&lpm, &power_states),
        ),
        PowerEntityConfig::new(
            "MIF",
            "MIF:",
            generate_state_residency_configs(&down, &power_states),
        ),
        PowerEntityConfig::new(
            "MIF-REQ",
            "MIF_REQ:",
            generate_state_residency_configs(&req, &mif_req_states),
        ),
        PowerEntityConfig::new(
            "SLC",
            "SLC:",
            generate_state_residency_configs(&down, &power_states),
        ),
        PowerEntityConfig::new(
            "SLC-REQ",
            "SLC_REQ:",
            generate_state_residency_configs(&req, &slc_req_states),
        ),
    ];

    stats.add_generic(
        fs.clone(),
        SourcePath::fixed(at(root, &format!("{ACPM_STATS}soc_stats"))),
        entities,
    );
}

/// Template shared by the radios that report in microseconds.
fn usec_template() -> StateResidencyTemplate {
    StateResidencyTemplate::new()
        .entry_count("count:")
        .total_time("duration_usec:", Transform::DivideBy(US_TO_MS))
        .last_entry("last_entry_timestamp_usec:", Transform::DivideBy(US_TO_MS))
}

/// Template shared by the PCIe links and NFC, which report in milliseconds.
fn msec_template() -> StateResidencyTemplate {
    StateResidencyTemplate::new()
        .entry_count("Cumulative count:")
        .total_time("Cumulative duration msec:", Transform::Identity)
        .last_entry("Last entry timestamp msec:", Transform::Identity)
}

fn add_gnss<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let states = [("ON", "GPS_ON:"), ("OFF", "GPS_OFF:")];
    stats.add_generic(
        fs.clone(),
        SourcePath::fixed(at(root, "/dev/bbd_pwrstat")),
        vec![PowerEntityConfig::new(
            "GPS",
            "",
            generate_state_residency_configs(&usec_template(), &states),
        )],
    );
}

fn add_mobile_radio<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    stats.add_generic(
        fs.clone(),
        SourcePath::fixed(at(root, "/sys/devices/platform/cpif/modem/power_stats")),
        vec![PowerEntityConfig::new(
            "MODEM",
            "",
            generate_state_residency_configs(&usec_template(), &[("SLEEP", "SLEEP:")]),
        )],
    );
}

fn add_nfc<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let states = [
        ("IDLE", "Idle mode:"),
        ("ACTIVE", "Active mode:"),
        ("ACTIVE-RW", "Active Reader/Writer mode:"),
    ];

    // The controller's bus number depends on enumeration order at boot
    let candidates = (0..NFC_I2C_BUSES).map(|i| {
        at(
            root,
            &format!("/sys/devices/platform/10c80000.hsi2c/i2c-{i}/{i}-0008/power_stats"),
        )
    });

    stats.add_generic(
        fs.clone(),
        SourcePath::candidates(candidates),
        vec![PowerEntityConfig::new(
            "NFC",
            "NFC subsystem",
            generate_state_residency_configs(&msec_template(), &states),
        )],
    );
}

fn add_pcie<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let states = [("UP", "Link up:"), ("DOWN", "Link down:")];

    for (entity, path) in [
        ("PCIe-Modem", "/sys/devices/platform/12100000.pcie/power_stats"),
        ("PCIe-WiFi", "/sys/devices/platform/13120000.pcie/power_stats"),
    ] {
        stats.add_generic(
            fs.clone(),
            SourcePath::fixed(at(root, path)),
            vec![PowerEntityConfig::new(
                entity,
                "Version: 1",
                generate_state_residency_configs(&msec_template(), &states),
            )],
        );
    }
}

fn add_wifi<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let pcie = StateResidencyTemplate::new()
        .entry_count("count:")
        .total_time("duration_usec:", Transform::DivideBy(US_TO_MS));

    let states = [("AWAKE", "AWAKE:"), ("ASLEEP", "ASLEEP:")];
    let pcie_states = [
        ("L0", "L0:"),
        ("L1", "L1:"),
        ("L1_1", "L1_1:"),
        ("L1_2", "L1_2:"),
        ("L2", "L2:"),
    ];

    stats.add_generic(
        fs.clone(),
        SourcePath::fixed(at(root, "/sys/wifi/power_stats")),
        vec![
            PowerEntityConfig::new(
                "WIFI",
                "WIFI",
                generate_state_residency_configs(&usec_template(), &states),
            ),
            PowerEntityConfig::new(
                "WIFI-PCIE",
                "WIFI-PCIE",
                generate_state_residency_configs(&pcie, &pcie_states),
            ),
        ],
    );
}

fn add_tpu<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let freqs = ["1119000", "1066000", "845000", "712000", "627000", "455000", "226000"];
    stats.add_provider(Box::new(TpuDvfsStateResidencyProvider::new(
        fs.clone(),
        at(root, "/sys/devices/platform/1a000000.rio/tpu_usage"),
        &freqs,
        TICK_TO_MS,
    )));
}

fn add_ufs<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    stats.add_provider(Box::new(UfsStateResidencyProvider::new(
        fs.clone(),
        at(root, "/sys/bus/platform/devices/13200000.ufs/ufs_stats"),
    )));
}

fn add_power_domains<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let template = StateResidencyTemplate::new()
        .entry_count("on_count:")
        .total_time("total_on_time_ns:", Transform::DivideBy(NS_TO_MS))
        .last_entry("last_on_time_ns:", Transform::DivideBy(NS_TO_MS));

    let domains = [
        "pd-tpu",
        "pd-ispfe",
        "pd-eh",
        "pd-bw",
        "pd-aur",
        "pd-yuvp",
        "pd-tnr",
        "pd-rgbp",
        "pd-mfc",
        "pd-mcsc",
        "pd-gse",
        "pd-gdc",
        "pd-g2d",
        "pd-dpuf1",
        "pd-dpuf0",
        "pd-dpub",
        "pd-embedded_g3d",
        "pd-g3d",
    ];

    let entities = domains
        .into_iter()
        .map(|name| {
            PowerEntityConfig::new(
                name,
                format!("{name}:"),
                generate_state_residency_configs(&template, &[("ON", "")]),
            )
        })
        .collect();

    stats.add_generic(
        fs.clone(),
        SourcePath::fixed(at(root, &format!("{ACPM_STATS}pd_stats"))),
        entities,
    );
}

fn add_dvfs<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let fvp_stats = at(root, &format!("{ACPM_STATS}fvp_stats"));

    // Operating points of these domains follow their frequency tables
    let adaptive = [
        ("CL0", at(root, "/sys/devices/system/cpu/cpufreq/policy0/stats")),
        ("CL1", at(root, "/sys/devices/system/cpu/cpufreq/policy4/stats")),
        ("CL2", at(root, "/sys/devices/system/cpu/cpufreq/policy8/stats")),
        (
            "MIF",
            at(root, "/sys/devices/platform/17000010.devfreq_mif/devfreq/17000010.devfreq_mif"),
        ),
    ];
    stats.add_provider(Box::new(DvfsStateResidencyProvider::adaptive(
        fs.clone(),
        fvp_stats.clone(),
        Transform::DivideBy(NS_TO_MS),
        &adaptive,
    )));

    let aur = DvfsDomain::new(
        "AUR",
        &[
            ("1065MHz", "1065000"),
            ("861MHz", "861000"),
            ("713MHz", "713000"),
            ("525MHz", "525000"),
            ("355MHz", "355000"),
            ("256MHz", "256000"),
            ("178MHz", "178000"),
        ],
    );
    stats.add_provider(Box::new(DvfsStateResidencyProvider::new(
        fs.clone(),
        fvp_stats,
        Transform::DivideBy(NS_TO_MS),
        vec![aur],
    )));
}

fn add_devfreq<F: FileSystem + Clone + 'static>(stats: &mut PowerStats, fs: &F, root: &Path) {
    let domains = [
        ("INT", "17000020.devfreq_int"),
        ("INTCAM", "17000030.devfreq_intcam"),
        ("DISP", "17000040.devfreq_disp"),
        ("CAM", "17000050.devfreq_cam"),
        ("TNR", "17000060.devfreq_tnr"),
        ("MFC", "17000070.devfreq_mfc"),
        ("BW", "17000080.devfreq_bw"),
        ("DSU", "17000090.devfreq_dsu"),
        ("BCI", "170000a0.devfreq_bci"),
    ];

    for (entity, device) in domains {
        let dir = at(root, &format!("/sys/devices/platform/{device}/devfreq/{device}"));
        stats.add_provider(Box::new(DevfreqStateResidencyProvider::new(
            fs.clone(),
            entity,
            dir,
        )));
    }

    stats.add_provider(Box::new(DevfreqStateResidencyProvider::new(
        fs.clone(),
        "GPU",
        at(root, "/sys/devices/platform/1f000000.mali"),
    )));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    #[test]
    fn test_catalogue_covers_every_table() {
        let stats = build(MockFs::new(), Path::new("/"));
        let info = stats.power_entity_info();
        let names: Vec<_> = info.iter().map(|e| e.name.as_str()).collect();

        for expected in [
            "AoC-A32", "AoC-Voltage", "AoC", "AoC-Count", "CLUSTER2", "CPU0", "CPU8", "LPM",
            "SLC-REQ", "GPS", "MODEM", "NFC", "PCIe-Modem", "PCIe-WiFi", "WIFI", "WIFI-PCIE",
            "TPU", "UFS", "pd-g3d", "CL0", "CL2", "AUR", "BCI", "GPU",
        ] {
            assert!(names.contains(&expected), "missing entity {expected}");
        }

        let ids: Vec<u32> = info.iter().map(|e| e.id).collect();
        let expected_ids: Vec<u32> = (0..info.len() as u32).collect();
        assert_eq!(ids, expected_ids);
    }

    #[test]
    fn test_empty_device_collects_nothing() {
        let mut stats = build(MockFs::new(), Path::new("/"));
        assert!(stats.collect().is_empty());
    }

    #[test]
    fn test_typical_device() {
        let mut stats = build(MockFs::typical_device(), Path::new("/"));
        let snapshot = stats.collect();

        let sleep = snapshot.find("LPM", "SLEEP").unwrap();
        assert_eq!(sleep.entry_count, Some(3120));
        assert_eq!(sleep.total_time_ms, Some(8_123_456));
        assert_eq!(sleep.last_entry_timestamp_ms, Some(91_000));

        // SLEEP_SLCMON is not confused with SLEEP
        assert_eq!(snapshot.find("LPM", "SLEEP_SLCMON").unwrap().entry_count, Some(4));
        assert_eq!(snapshot.find("MIF", "SLEEP").unwrap().entry_count, Some(3000));
        assert_eq!(snapshot.find("MIF-REQ", "TPU").unwrap().entry_count, Some(77));
        assert_eq!(snapshot.find("SLC-REQ", "AOC").unwrap().total_time_ms, Some(1234));

        assert_eq!(snapshot.find("CLUSTER1", "DOWN").unwrap().entry_count, Some(2000));
        assert_eq!(snapshot.find("AoC-Count", "RESTART").unwrap().entry_count, Some(2));
        assert_eq!(snapshot.find("AoC-A32", "DWN").unwrap().total_time_ms, Some(1000));

        let modem = snapshot.find("MODEM", "SLEEP").unwrap();
        assert_eq!(modem.total_time_ms, Some(654_321));
        assert_eq!(modem.last_entry_timestamp_ms, Some(99_999));

        // NFC sits on the third candidate bus
        assert_eq!(snapshot.find("NFC", "ACTIVE-RW").unwrap().entry_count, Some(5));

        assert_eq!(snapshot.find("PCIe-Modem", "DOWN").unwrap().total_time_ms, Some(88_000));
        assert_eq!(snapshot.find("WIFI", "ASLEEP").unwrap().entry_count, Some(41));
        let l1_2 = snapshot.find("WIFI-PCIE", "L1_2").unwrap();
        assert_eq!(l1_2.total_time_ms, Some(4500));
        assert_eq!(l1_2.last_entry_timestamp_ms, None);

        assert_eq!(snapshot.find("pd-g3d", "ON").unwrap().entry_count, Some(11));
        assert_eq!(snapshot.find("pd-embedded_g3d", "ON").unwrap().entry_count, Some(9));
        assert_eq!(snapshot.find("GPU", "302000").unwrap().total_time_ms, Some(5100));

        // Idle time includes the 8123456 ms the SoC spent in SLEEP
        let cpu4 = snapshot.find("CPU4", "DOWN").unwrap();
        assert_eq!(cpu4.entry_count, Some(640));
        assert_eq!(cpu4.total_time_ms, Some(52_000 + 8_123_456));

        assert_eq!(snapshot.find("CL0", "1950MHz").unwrap().total_time_ms, Some(9100));
        assert_eq!(snapshot.find("AUR", "1065MHz").unwrap().entry_count, Some(12));
        assert!(snapshot.find("AUR", "178MHz").unwrap().is_empty());
        assert_eq!(snapshot.find("TPU", "845000").unwrap().total_time_ms, Some(35));

        let ufs = snapshot.find("UFS", "HIBERN8").unwrap();
        assert_eq!(ufs.entry_count, Some(4521));
        assert_eq!(ufs.total_time_ms, Some(98_765));

        // GNSS node is not present on this device
        assert!(snapshot.entity("GPS").is_empty());
    }

    #[test]
    fn test_root_prefix() {
        let mut fs = MockFs::new();
        fs.add_file("/data/capture/sys/wifi/power_stats", "WIFI\ncount:AWAKE: 6\n");

        let mut stats = build(fs, Path::new("/data/capture"));
        let snapshot = stats.collect();
        assert_eq!(snapshot.find("WIFI", "AWAKE").unwrap().entry_count, Some(6));
    }
}
