use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

/// Helper function to run tabviz with CLI arguments and optional stdin CSV
fn run_tabviz(args: &[&str], stdin_csv: Option<&str>) -> Result<Vec<u8>, String> {
    let mut child = Command::new("cargo")
        .args(&["run", "--bin", "tabviz", "--"])
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("Failed to spawn process: {}", e))?;

    if let Some(csv) = stdin_csv {
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(csv.as_bytes())
                .map_err(|e| format!("Failed to write to stdin: {}", e))?;
        }
    }

    let output = child
        .wait_with_output()
        .map_err(|e| format!("Failed to wait for process: {}", e))?;

    if output.status.success() {
        Ok(output.stdout)
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

/// Check if bytes are a valid PNG
fn is_valid_png(bytes: &[u8]) -> bool {
    bytes.len() > 8 && &bytes[0..8] == &[137, 80, 78, 71, 13, 10, 26, 10]
}

#[test]
fn test_end_to_end_bar_png() {
    let result = run_tabviz(
        &[
            "test/sales.csv",
            "--chart",
            "bar",
            "--role",
            "category=region",
            "--role",
            "value=sales",
            "--format",
            "png",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()), "Output is not a valid PNG");
}

#[test]
fn test_end_to_end_line_png() {
    let result = run_tabviz(
        &[
            "test/timeseries.csv",
            "--chart",
            "line",
            "--role",
            "x=date",
            "--role",
            "y=temperature",
            "--format",
            "png",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_grouped_bar_png() {
    let result = run_tabviz(
        &[
            "test/sales.csv",
            "--chart",
            "grouped bar",
            "--role",
            "category=region",
            "--role",
            "value=sales",
            "--role",
            "group=quarter",
            "--format",
            "png",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_candlestick_png() {
    let result = run_tabviz(
        &[
            "test/prices.csv",
            "--chart",
            "candlestick",
            "--role",
            "date=date",
            "--role",
            "open=open",
            "--role",
            "high=high",
            "--role",
            "low=low",
            "--role",
            "close=close",
            "--format",
            "png",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_unicode_columns() {
    let result = run_tabviz(
        &[
            "test/unicode.csv",
            "--chart",
            "bar",
            "--role",
            "category=ville",
            "--role",
            "value=température",
            "--format",
            "png",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_pie_json_description() {
    let result = run_tabviz(
        &[
            "test/sales.csv",
            "--chart",
            "pie",
            "--role",
            "names=region",
            "--role",
            "values=sales",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());

    let json: serde_json::Value =
        serde_json::from_slice(&result.unwrap()).expect("output is not valid JSON");
    assert_eq!(json["data"]["kind"], "slices");
    assert!(json["title"].as_str().unwrap().contains("Pie Chart"));
}

#[test]
fn test_end_to_end_stdin_csv() {
    let csv = "x,y\n1,10\n2,20\n3,30\n";
    let result = run_tabviz(
        &[
            "-",
            "--chart",
            "scatter",
            "--role",
            "x=x",
            "--role",
            "y=y",
            "--format",
            "png",
        ],
        Some(csv),
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_large_dataset() {
    let mut csv = String::from("x,y\n");
    for i in 0..500 {
        csv.push_str(&format!("{},{}\n", i, (i * 7) % 113));
    }
    let result = run_tabviz(
        &[
            "-",
            "--chart",
            "scatter",
            "--role",
            "x=x",
            "--role",
            "y=y",
            "--format",
            "png",
        ],
        Some(&csv),
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    assert!(is_valid_png(&result.unwrap()));
}

#[test]
fn test_end_to_end_json_input_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("data.json");
    fs::write(
        &path,
        r#"[{"region": "north", "sales": 10}, {"region": "south", "sales": 20}]"#,
    )
    .expect("write JSON input");

    let result = run_tabviz(
        &[
            path.to_str().unwrap(),
            "--chart",
            "pie",
            "--role",
            "names=region",
            "--role",
            "values=sales",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
}

#[test]
fn test_end_to_end_out_file() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("chart.png");
    let result = run_tabviz(
        &[
            "test/timeseries.csv",
            "--chart",
            "line",
            "--role",
            "x=date",
            "--role",
            "y=temperature",
            "--format",
            "png",
            "--out",
            path.to_str().unwrap(),
            "--width",
            "400",
            "--height",
            "300",
            "--title",
            "Daily temperature",
        ],
        None,
    );
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let bytes = fs::read(&path).expect("read output file");
    assert!(is_valid_png(&bytes));
}

#[test]
fn test_end_to_end_columns_listing() {
    let result = run_tabviz(&["test/sales.csv", "--columns"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let text = String::from_utf8_lossy(&result.unwrap()).to_string();
    assert!(text.contains("region"));
    assert!(text.contains("categorical"));
    assert!(text.contains("numeric"));
}

#[test]
fn test_end_to_end_list_charts() {
    let result = run_tabviz(&["test/sales.csv", "--list-charts"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let text = String::from_utf8_lossy(&result.unwrap()).to_string();
    assert!(text.contains("Bar Chart"));
    assert!(text.contains("Scatter Plot"));
    assert!(text.contains("roles:"));
}

#[test]
fn test_end_to_end_suggest() {
    let result = run_tabviz(&["test/scatter.csv", "--suggest", "scatter"], None);
    assert!(result.is_ok(), "Failed: {:?}", result.err());
    let text = String::from_utf8_lossy(&result.unwrap()).to_string();
    assert!(text.contains("--chart 'scatter'"));
    assert!(text.contains("--role 'x=height'"));
    assert!(text.contains("--role 'y=weight'"));
}

#[test]
fn test_end_to_end_missing_role() {
    let result = run_tabviz(
        &["test/sales.csv", "--chart", "pie", "--role", "names=region"],
        None,
    );
    assert!(result.is_err(), "Should have failed with unbound role");
    assert!(result.unwrap_err().contains("'values'"));
}

#[test]
fn test_end_to_end_unknown_chart() {
    let result = run_tabviz(&["test/sales.csv", "--chart", "spiral"], None);
    assert!(result.is_err(), "Should have failed with unknown chart");
    assert!(result.unwrap_err().contains("unknown chart type 'spiral'"));
}

#[test]
fn test_end_to_end_type_mismatch() {
    let result = run_tabviz(
        &[
            "test/sales.csv",
            "--chart",
            "scatter",
            "--role",
            "x=region",
            "--role",
            "y=sales",
        ],
        None,
    );
    assert!(result.is_err(), "Should have failed with type mismatch");
    assert!(result.unwrap_err().contains("requires a numeric column"));
}

#[test]
fn test_end_to_end_empty_csv() {
    let csv = "x,y\n";
    let result = run_tabviz(
        &["-", "--chart", "scatter", "--role", "x=x", "--role", "y=y"],
        Some(csv),
    );
    assert!(result.is_err(), "Should have failed with empty CSV error");
    assert!(result.unwrap_err().contains("at least one data row"));
}

#[test]
fn test_end_to_end_png_for_description_only_chart() {
    let result = run_tabviz(
        &[
            "test/sales.csv",
            "--chart",
            "sankey",
            "--role",
            "source=region",
            "--role",
            "target=quarter",
            "--role",
            "values=sales",
            "--format",
            "png",
        ],
        None,
    );
    assert!(result.is_err(), "Should have refused PNG for sankey");
    assert!(result.unwrap_err().contains("no PNG renderer"));
}
