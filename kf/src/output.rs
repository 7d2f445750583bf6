//! Human readable rendering of bindings
use kf_core::{BindingExt, ObjectExt, ServiceBinding};
use std::io::{self, Write};

/// Describe a single binding, one field per line
pub fn binding_details(out: &mut impl Write, binding: &ServiceBinding) -> io::Result<()> {
    writeln!(out, "Name:       {}", binding.name())?;
    if let Some(ns) = &binding.metadata.namespace {
        writeln!(out, "Namespace:  {ns}")?;
    }
    writeln!(out, "App:        {}", binding.app_name().unwrap_or_default())?;
    writeln!(out, "Service:    {}", binding.instance_name())?;
    writeln!(out, "Secret:     {}", binding.secret_name())?;
    writeln!(out, "Ready:      {}", binding.ready())?;
    if let Some(params) = binding.spec.parameters.as_ref().filter(|p| !is_empty_object(p)) {
        writeln!(out, "Parameters: {params}")?;
    }
    Ok(())
}

fn is_empty_object(value: &serde_json::Value) -> bool {
    value.as_object().is_some_and(|o| o.is_empty())
}

/// Tabulate bindings, columns sized to their widest cell
pub fn bindings_table(out: &mut impl Write, bindings: &[ServiceBinding]) -> io::Result<()> {
    let header = ["NAME", "APP", "SERVICE", "SECRET", "READY"];
    let rows: Vec<[String; 5]> = bindings
        .iter()
        .map(|b| {
            [
                b.name().to_string(),
                b.app_name().unwrap_or_default().to_string(),
                b.instance_name().to_string(),
                b.secret_name().to_string(),
                b.ready().to_string(),
            ]
        })
        .collect();
    let mut widths = header.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }
    write_row(out, &widths, header)?;
    for row in &rows {
        write_row(out, &widths, row.each_ref().map(String::as_str))?;
    }
    Ok(())
}

fn write_row(out: &mut impl Write, widths: &[usize; 5], cells: [&str; 5]) -> io::Result<()> {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    writeln!(out, "{}", line.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_core::{Condition, ConditionStatus};
    use serde_json::json;

    #[test]
    fn details_include_parameters() {
        let b = ServiceBinding::bind("db", "mydb", "myapp")
            .within("dev")
            .parameters(json!({"plan": "small"}));
        let mut out = Vec::new();
        binding_details(&mut out, &b).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Name:       db\n\
             Namespace:  dev\n\
             App:        myapp\n\
             Service:    mydb\n\
             Secret:     db\n\
             Ready:      Unknown\n\
             Parameters: {\"plan\":\"small\"}\n"
        );
    }

    #[test]
    fn table_aligns_columns() {
        let ready = ServiceBinding::bind("binding-long-name", "mydb", "myapp")
            .with_condition(Condition::new("Ready", ConditionStatus::True));
        let bindings = vec![ready, ServiceBinding::bind("b", "cache", "web")];
        let mut out = Vec::new();
        bindings_table(&mut out, &bindings).unwrap();
        let printed = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "NAME               APP    SERVICE  SECRET             READY");
        assert_eq!(lines[1], "binding-long-name  myapp  mydb     binding-long-name  True");
        assert_eq!(lines[2], "b                  web    cache    b                  Unknown");
    }

    #[test]
    fn empty_table_still_has_a_header() {
        let mut out = Vec::new();
        bindings_table(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "NAME  APP  SERVICE  SECRET  READY\n");
    }
}
