use jdcode_core::status::{Resolution, StatusResolver, UNKNOWN_VERSION};
use jdcode_core::VersionCheck;

struct CheckResult {
    label: String,
    ok: bool,
    detail: String,
}

pub async fn run_doctor(resolver: &StatusResolver) {
    let resolution = resolver.resolve_detailed().await;
    let checks = collect_checks(resolver, &resolution);

    let mut ok_count = 0;
    let mut fail_count = 0;

    for check in &checks {
        let icon = if check.ok { "[OK]" } else { "[!!]" };
        println!("  {} {}: {}", icon, check.label, check.detail);
        if check.ok {
            ok_count += 1;
        } else {
            fail_count += 1;
        }
    }

    println!();
    println!("  {} passed, {} issues found", ok_count, fail_count);
}

fn collect_checks(resolver: &StatusResolver, resolution: &Resolution) -> Vec<CheckResult> {
    vec![
        check_version_file(resolver, resolution),
        check_version_script(resolver, resolution),
        check_notifications(resolution),
        check_port(resolver, resolution),
    ]
}

fn check_version_file(resolver: &StatusResolver, resolution: &Resolution) -> CheckResult {
    let path = resolver.local_version_path().display();
    let version = &resolution.record.local_version;
    if version == UNKNOWN_VERSION {
        CheckResult {
            label: "Version file".into(),
            ok: false,
            detail: format!("{} (missing, unreadable or blank)", path),
        }
    } else {
        CheckResult {
            label: "Version file".into(),
            ok: true,
            detail: format!("{} ({})", version, path),
        }
    }
}

fn check_version_script(resolver: &StatusResolver, resolution: &Resolution) -> CheckResult {
    let path = resolver.version_check_script_path().display();
    let outcome = &resolution.version_check;
    // No script installed is not a fault
    let ok = matches!(outcome, VersionCheck::Reported(_) | VersionCheck::Missing);
    CheckResult {
        label: "Version check".into(),
        ok,
        detail: format!("{} ({})", outcome, path),
    }
}

fn check_notifications(resolution: &Resolution) -> CheckResult {
    let record = &resolution.record;
    if !record.notifications_enabled {
        CheckResult {
            label: "Notifications".into(),
            ok: true,
            detail: "Disabled".into(),
        }
    } else if record.notification_missing_vars.is_empty() {
        CheckResult {
            label: "Notifications".into(),
            ok: true,
            detail: "Enabled".into(),
        }
    } else {
        CheckResult {
            label: "Notifications".into(),
            ok: false,
            detail: format!(
                "Enabled but missing {}",
                record.notification_missing_vars.join(", ")
            ),
        }
    }
}

fn check_port(resolver: &StatusResolver, resolution: &Resolution) -> CheckResult {
    let port = &resolution.record.listening_port;
    match port.parse::<u16>() {
        Ok(p) if p > 0 => CheckResult {
            label: "Port".into(),
            ok: true,
            detail: format!("{} (from ${})", port, resolver.port_var()),
        },
        _ => CheckResult {
            label: "Port".into(),
            ok: false,
            detail: format!("'{}' is not a valid port (from ${})", port, resolver.port_var()),
        },
    }
}
