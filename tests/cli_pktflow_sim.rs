use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time went backwards")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "pktflow-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(dir: &PathBuf, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("write temp file");
    path
}

fn run(args: &[&str]) -> Output {
    let output = Command::new(env!("CARGO_BIN_EXE_pktflow_sim"))
        .args(args)
        .output()
        .expect("run pktflow_sim");
    assert!(
        output.status.success(),
        "pktflow_sim failed: stderr={}",
        String::from_utf8_lossy(&output.stderr)
    );
    output
}

const TOPOLOGIES: &str = r#"
{
    "topologies": [
        {
            "name": "triangle",
            "nodes": [
                { "id": "A", "position": [-3, 0, 0] },
                { "id": "B", "position": [0, 2, 0] },
                { "id": "C", "position": [3, 0, 0] }
            ],
            "links": [
                { "id": "AB", "source": "A", "target": "B" },
                { "id": "BC", "source": "B", "target": "C" }
            ]
        },
        {
            "name": "pair",
            "nodes": [
                { "id": "X", "position": [0, 0, 0] },
                { "id": "Y", "position": [1, 0, 0] }
            ],
            "links": [ { "id": "XY", "source": "X", "target": "Y", "latency": 5 } ]
        }
    ],
    "engine": { "seed": 3 }
}
"#;

#[test]
fn injected_packet_is_delivered_and_reported() {
    let dir = unique_temp_dir("inject");
    let topo = write_file(&dir, "topologies.json", TOPOLOGIES);

    let output = run(&[
        "--topology",
        topo.to_str().unwrap(),
        "--no-auto-generate",
        "--drain-probability",
        "1",
        "--dt",
        "0.1",
        "--ticks",
        "100",
        "--stats-every",
        "50",
        "--inject",
        "A:C",
        "--inject",
        "A:A",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(
        stdout.contains("topology name=triangle, nodes=3, links=2, routing=adaptive"),
        "stdout={stdout}"
    );
    assert!(stdout.contains("injected pkt_id=0 A->C"), "stdout={stdout}");
    assert!(stdout.contains("inject failed A->A"), "stdout={stdout}");
    assert_eq!(stdout.lines().filter(|l| l.starts_with("stats ")).count(), 2);

    let done = stdout
        .lines()
        .find(|l| l.starts_with("done @"))
        .expect("final stats line");
    assert!(done.contains("generated=1"), "{done}");
    assert!(done.contains("delivered=1"), "{done}");
    assert!(done.contains("dropped=0"), "{done}");
    assert!(done.contains("delivery_rate=100.0%"), "{done}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_topology_file_falls_back_to_default() {
    let dir = unique_temp_dir("malformed");
    let topo = write_file(&dir, "broken.json", "{ \"topologies\": [ ");

    let output = run(&["--topology", topo.to_str().unwrap(), "--ticks", "5"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("topology name=default, nodes=3, links=2"),
        "stdout={stdout}"
    );

    let output = run(&["--ticks", "5"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("topology name=default"), "stdout={stdout}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn selects_topology_by_name_and_writes_viz_frames() {
    let dir = unique_temp_dir("viz");
    let topo = write_file(&dir, "topologies.json", TOPOLOGIES);
    let out_json = dir.join("viz.json");

    let output = run(&[
        "--topology",
        topo.to_str().unwrap(),
        "--topology-name",
        "pair",
        "--routing",
        "flooding",
        "--ticks",
        "40",
        "--viz-json",
        out_json.to_str().unwrap(),
        "--viz-every",
        "10",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("topology name=pair, nodes=2, links=1, routing=flooding"),
        "stdout={stdout}"
    );

    let raw = fs::read_to_string(&out_json).expect("read viz.json");
    let v: Value = serde_json::from_str(&raw).expect("parse viz.json");
    let frames = v.as_array().expect("viz.json must be a JSON array");
    assert_eq!(frames.len(), 4);
    let nodes = frames[0]
        .get("nodes")
        .and_then(|n| n.as_array())
        .expect("frame nodes");
    assert_eq!(nodes.len(), 2);
    assert!(frames[3].get("t_s").and_then(|t| t.as_f64()).unwrap() > 0.0);

    let _ = fs::remove_dir_all(&dir);
}
