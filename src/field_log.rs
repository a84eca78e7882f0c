use serde_json::json;

/// Write-only notification sink for the effect runtime. Callers may drain it
/// for display or ignore it entirely; nothing in the runtime reads it back.
#[derive(Clone, Debug, Default)]
pub struct FieldLog {
    log: Vec<String>,
}

impl FieldLog {
    pub fn new() -> Self {
        Self { log: Vec::new() }
    }

    /// Free-form human-readable message.
    pub fn print(&mut self, message: &str) {
        self.log.push(format!("|message|{message}"));
    }

    pub fn log_turn(&mut self, turn: u32) {
        self.log.push(format!("|turn|{turn}"));
    }

    pub fn log_field_start(&mut self, effect: &str) {
        self.log.push(format!("|-fieldstart|{effect}"));
    }

    pub fn log_field_end(&mut self, effect: &str) {
        self.log.push(format!("|-fieldend|{effect}"));
    }

    pub fn log_weather_upkeep(&mut self, effect: &str) {
        self.log.push(format!("|-weather|{effect}|upkeep"));
    }

    pub fn log_weather_damage(&mut self, target: &str, effect: &str, hp: u32, max_hp: u32) {
        self.log
            .push(format!("|-damage|{target}|{hp}/{max_hp}|{effect}"));
    }

    pub fn log_veto(&mut self, user: &str, action: &str, effect: &str) {
        self.log
            .push(format!("|-activate|{effect}|veto|{user}|{action}"));
    }

    pub fn log_lines(&self) -> &[String] {
        &self.log
    }

    /// Count of lines starting with `prefix`; handy for exactly-once checks.
    pub fn count_lines(&self, prefix: &str) -> usize {
        self.log.iter().filter(|line| line.starts_with(prefix)).count()
    }

    pub fn to_json(&self) -> serde_json::Value {
        json!({ "log": self.log })
    }
}
