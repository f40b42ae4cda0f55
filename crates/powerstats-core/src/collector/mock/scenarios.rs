//! Pre-built mock filesystem scenarios for testing.
//!
//! These scenarios provide realistic counter files for the device tables in
//! [`crate::device`].

use super::filesystem::MockFs;

impl MockFs {
    /// Creates a device with most residency sources populated.
    ///
    /// Present: AoC A32 core and restart count, CPU clusters and cpupm idle
    /// states, SoC stats, modem, NFC (on i2c bus 2), PCIe modem link, WiFi,
    /// TPU usage, UFS hibern8 counters, a few power domains, DVFS stats for
    /// CL0 and AUR, and the GPU devfreq table. The GNSS node is absent.
    pub fn typical_device() -> Self {
        let mut fs = Self::new();

        fs.add_file(
            "/sys/devices/platform/17000000.aoc/control/a32_off",
            "Counter: 10\nCumulative time: 24576000\nTime last entered: 245760\n",
        );
        fs.add_file(
            "/sys/devices/platform/17000000.aoc/control/a32_wfi",
            "Counter: 820\nCumulative time: 4915200\nTime last entered: 491520\n",
        );
        fs.add_file("/sys/devices/platform/17000000.aoc/restart_count", "2\n");

        fs.add_file(
            "/sys/devices/platform/acpm_stats/core_stats",
            "\
CLUSTER0
 down_count: 1000
 total_down_time_ns: 5000000000
 last_down_time_ns: 6000000000
CLUSTER1
 down_count: 2000
 total_down_time_ns: 7000000000
 last_down_time_ns: 8000000000
CLUSTER2
 down_count: 300
 total_down_time_ns: 900000000
 last_down_time_ns: 8100000000
",
        );

        fs.add_file(
            "/sys/devices/system/cpu/cpupm/cpupm/time_in_state",
            "\
cpu0
  [state1]  1500  61000000
cpu4
  [state1]  640  52000000
",
        );

        fs.add_file(
            "/sys/devices/platform/acpm_stats/soc_stats",
            "\
LPM:
success_count:SICD 120
total_time_ns:SICD 45000000000
last_entry_time_ns:SICD 90000000000
success_count:SLEEP 3120
total_time_ns:SLEEP 8123456789012
last_entry_time_ns:SLEEP 91000000000
success_count:SLEEP_SLCMON 4
total_time_ns:SLEEP_SLCMON 12000000
last_entry_time_ns:SLEEP_SLCMON 85000000000
success_count:STOP 0
total_time_ns:STOP 0
last_entry_time_ns:STOP 0
MIF:
down_count:SICD 110
total_down_time_ns:SICD 44000000000
last_down_time_ns:SICD 90000000000
down_count:SLEEP 3000
total_down_time_ns:SLEEP 8000000000000
last_down_time_ns:SLEEP 91000000000
MIF_REQ:
req_up_count:AOC 500
total_req_up_time_ns:AOC 70000000000
last_req_up_time_ns:AOC 90500000000
req_up_count:TPU 77
total_req_up_time_ns:TPU 3000000000
last_req_up_time_ns:TPU 80000000000
SLC:
down_count:SLEEP 2900
total_down_time_ns:SLEEP 7900000000000
last_down_time_ns:SLEEP 91000000000
SLC_REQ:
req_up_count:AOC 9
total_req_up_time_ns:AOC 1234000000
last_req_up_time_ns:AOC 60000000000
",
        );

        fs.add_file(
            "/sys/devices/platform/cpif/modem/power_stats",
            "\
count:SLEEP: 500
duration_usec:SLEEP: 654321000
last_entry_timestamp_usec:SLEEP: 99999999
",
        );

        fs.add_file(
            "/sys/devices/platform/10c80000.hsi2c/i2c-2/2-0008/power_stats",
            "\
NFC subsystem
Cumulative count:Idle mode: 30
Cumulative duration msec:Idle mode: 600000
Last entry timestamp msec:Idle mode: 90000
Cumulative count:Active mode: 12
Cumulative duration msec:Active mode: 4000
Last entry timestamp msec:Active mode: 85000
Cumulative count:Active Reader/Writer mode: 5
Cumulative duration msec:Active Reader/Writer mode: 1500
Last entry timestamp msec:Active Reader/Writer mode: 86000
",
        );

        fs.add_file(
            "/sys/devices/platform/12100000.pcie/power_stats",
            "\
Version: 1
Cumulative count:Link up: 12
Cumulative duration msec:Link up: 100000
Last entry timestamp msec:Link up: 90100
Cumulative count:Link down: 11
Cumulative duration msec:Link down: 88000
Last entry timestamp msec:Link down: 90200
",
        );

        fs.add_file(
            "/sys/wifi/power_stats",
            "\
WIFI
count:AWAKE: 40
duration_usec:AWAKE: 123000000
last_entry_timestamp_usec:AWAKE: 5000000
count:ASLEEP: 41
duration_usec:ASLEEP: 800000000
last_entry_timestamp_usec:ASLEEP: 6000000
WIFI-PCIE
count:L0: 3
duration_usec:L0: 1000000
count:L1: 2
duration_usec:L1: 2000000
count:L1_1: 1
duration_usec:L1_1: 300000
count:L1_2: 7
duration_usec:L1_2: 4500000
count:L2: 1
duration_usec:L2: 10000
",
        );

        fs.add_file(
            "/sys/devices/platform/1a000000.rio/tpu_usage",
            "uid: 1119000 1066000 845000\n1000: 12000 0 3500\n10211: 8000 40000 0\n",
        );

        let ufs = "/sys/bus/platform/devices/13200000.ufs/ufs_stats";
        fs.add_file(format!("{ufs}/hibern8_exit_cnt"), "4521\n");
        fs.add_file(format!("{ufs}/hibern8_total_us"), "98765432\n");
        fs.add_file(format!("{ufs}/last_hibern8_enter_time"), "1234567\n");

        fs.add_file(
            "/sys/devices/platform/acpm_stats/pd_stats",
            "\
pd-tpu:
on_count: 5
total_on_time_ns: 1000000000
last_on_time_ns: 2000000000
pd-embedded_g3d:
on_count: 9
total_on_time_ns: 3000000000
last_on_time_ns: 4000000000
pd-g3d:
on_count: 11
total_on_time_ns: 5000000000
last_on_time_ns: 6000000000
",
        );

        fs.add_file(
            "/sys/devices/platform/acpm_stats/fvp_stats",
            "\
CL0
  1950000  300  9100000000
  2850000  120  5400000000
AUR
  1065000  12  3400000000
  861000  4  1200000000
",
        );
        fs.add_file(
            "/sys/devices/system/cpu/cpufreq/policy0/stats/time_in_state",
            "1950000 9100\n2850000 5400\n",
        );

        fs.add_file(
            "/sys/devices/platform/1f000000.mali/time_in_state",
            "150000 1000\n302000 5100\n890000 20\n",
        );

        fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn test_typical_device_layout() {
        let fs = MockFs::typical_device();
        assert!(fs.exists(Path::new("/sys/devices/platform/acpm_stats/soc_stats")));
        assert!(fs.exists(Path::new("/sys/devices/platform/10c80000.hsi2c/i2c-2")));
        assert!(fs.exists(Path::new("/sys/bus/platform/devices/13200000.ufs/ufs_stats")));
        assert!(!fs.exists(Path::new("/dev/bbd_pwrstat")));
    }
}
