use crate::domain::OperationReport;

/// Operator-facing summary of an operation, printed on stdout.
pub fn render(report: &OperationReport) -> String {
    let mut lines = Vec::new();

    if let Some(output) = report.output.as_deref() {
        let trimmed = output.trim_end();
        if !trimmed.is_empty() {
            lines.push(trimmed.to_string());
        }
    }

    match &report.error {
        None => lines.push(format!("✅ {} succeeded", report.operation)),
        Some(err) => {
            lines.push(format!("❌ {} failed: {}", report.operation, err));
            if let Some(output) = err.output() {
                lines.extend(output.trim_end().lines().map(|l| format!("   | {l}")));
            }
        }
    }

    lines.extend(report.hints.iter().map(|hint| format!("   {hint}")));
    lines.join("\n")
}

pub fn print(report: &OperationReport) {
    println!("{}", render(report));
}
