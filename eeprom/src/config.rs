/// ELF `e_machine` for RISC-V.
pub const EM_RISCV: u16 = 243;

/// Board wiring the loader is started with. The firmware boots with
/// [`Config::DEFAULT`]; tests hand in their own.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub component_channel: usize,
    pub diagnostic_channel: usize,
    /// Where provisioning left the boot filesystem's identifier.
    pub boot_id_region: usize,
    pub kernel_path: &'static str,
    pub filesystem_category: &'static str,
    pub machine: u16,
}

impl Config {
    pub const DEFAULT: Config = Config {
        component_channel: 0x1000_1000,
        diagnostic_channel: 0x1000_2000,
        boot_id_region: 0x2001_0000,
        kernel_path: "/kernel",
        filesystem_category: "filesystem",
        machine: EM_RISCV,
    };
}

impl Default for Config {
    fn default() -> Self { Config::DEFAULT }
}
