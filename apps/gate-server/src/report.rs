//! Text output of the `check` and `decide` subcommands.

use access_gate::AccessGate;

use crate::config::AppConfig;

/// Effective settings, management endpoints and the rule table.
///
/// Gate settings are read back from the built gate, so the report shows what
/// the middleware enforces.
#[must_use]
pub fn check_report(config: &AppConfig, gate: &AccessGate, user_count: usize) -> String {
    let gate_cfg = gate.config();
    let mut lines = vec![
        "Configuration is valid".to_owned(),
        String::new(),
        format!("server.bind_addr:      {}", config.server.bind_addr),
        format!("logging.level:         {}", config.logging.level),
        format!("gate.realm:            {}", gate_cfg.realm),
        format!("gate.csrf_protection:  {}", gate_cfg.csrf_protection),
        format!(
            "gate.public_endpoints: [{}]",
            gate_cfg.policy.public_endpoints.join(", ")
        ),
        format!("authn.users:           {user_count}"),
        String::new(),
        "Management endpoints:".to_owned(),
    ];

    lines.extend(
        gate.resolver()
            .endpoints()
            .map(|(id, path)| format!("  {id:<10} {path}")),
    );
    lines.push(String::new());
    lines.push("Access rules (first match wins):".to_owned());
    lines.extend(
        gate.policy()
            .rules()
            .iter()
            .enumerate()
            .map(|(index, rule)| format!("  {index}. {} -> {}", rule.matcher, rule.decision)),
    );

    lines.join("\n")
}

/// `<path> -> <endpoint id or -> -> <decision>`
#[must_use]
pub fn decision_line(gate: &AccessGate, path: &str) -> String {
    let (descriptor, evaluation) = gate.evaluate_path(path);
    format!(
        "{path} -> {} -> {}",
        descriptor.endpoint().unwrap_or("-"),
        evaluation.decision
    )
}
