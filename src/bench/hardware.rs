use std::fmt;

/// Processor and accelerator names attached to every benchmark record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HardwareInfo {
    pub cpu: String,
    pub gpu: String,
}

impl HardwareInfo {
    pub const UNKNOWN_CPU: &'static str = "Unknown_CPU";
    pub const UNKNOWN_GPU: &'static str = "Unknown_GPU";

    pub fn new(cpu: impl Into<String>, gpu: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            gpu: gpu.into(),
        }
    }

    /// Queries the environment; anything that cannot be found becomes a placeholder.
    pub fn detect() -> Self {
        let cpu = std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|text| cpu_model_name(&text))
            .unwrap_or_else(|| Self::UNKNOWN_CPU.to_string());
        let gpu = crate::engine::adapter_name()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| Self::UNKNOWN_GPU.to_string());
        Self { cpu, gpu }
    }

    /// `<gpu>_<cpu>` with spaces replaced by underscores.
    pub fn identifier(&self) -> String {
        format!("{}_{}", self.gpu, self.cpu).replace(' ', "_")
    }
}

impl Default for HardwareInfo {
    fn default() -> Self {
        Self::new(Self::UNKNOWN_CPU, Self::UNKNOWN_GPU)
    }
}

impl fmt::Display for HardwareInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cpu: {}, gpu: {}", self.cpu, self.gpu)
    }
}

fn cpu_model_name(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim() == "model name")
        .map(|(_, value)| value.trim().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpu_model_name() {
        let cpuinfo = "processor\t: 0\nvendor_id\t: GenuineIntel\nmodel name\t: Intel(R) Xeon(R) CPU @ 2.20GHz\nflags\t\t: fpu\n";
        assert_eq!(
            cpu_model_name(cpuinfo).as_deref(),
            Some("Intel(R) Xeon(R) CPU @ 2.20GHz")
        );
        assert_eq!(cpu_model_name("processor\t: 0\n"), None);
        assert_eq!(cpu_model_name("model name\t:   \n"), None);
    }

    #[test]
    fn test_identifier() {
        let hw = HardwareInfo::new("AMD EPYC 7B12", "Tesla T4");
        assert_eq!(hw.identifier(), "Tesla_T4_AMD_EPYC_7B12");
        assert_eq!(HardwareInfo::default().identifier(), "Unknown_GPU_Unknown_CPU");
    }

    #[test]
    fn test_detect_never_fails() {
        let hw = HardwareInfo::detect();
        assert!(!hw.cpu.is_empty());
        assert!(!hw.gpu.is_empty());
    }
}
