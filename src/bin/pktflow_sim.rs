//! 包交换网络仿真（无界面）
//!
//! 加载拓扑文件（失败时使用默认拓扑），按固定步长驱动引擎若干 tick，输出统计。

use clap::Parser;
use pktflow::net::NodeId;
use pktflow::routing::RoutingKind;
use pktflow::sim::{Engine, EngineConfig, Statistics};
use pktflow::topo::{TopologyDocument, load_or_default, read_document};
use pktflow::viz::VizLogger;
use std::fs;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(
    name = "pktflow-sim",
    about = "包交换网络仿真：store-and-forward 排队 + 拥塞自适应路由"
)]
struct Args {
    /// 拓扑文件（JSON）；缺失或无效时使用默认拓扑
    #[arg(long)]
    topology: Option<PathBuf>,

    /// 选择文件中的第几个拓扑（越界回绕）
    #[arg(long, default_value_t = 0)]
    topology_index: usize,

    /// 按名称选择拓扑（优先于 --topology-index）
    #[arg(long)]
    topology_name: Option<String>,

    /// 路由策略
    #[arg(long, value_enum)]
    routing: Option<RoutingKind>,

    /// 随机种子
    #[arg(long)]
    seed: Option<u64>,

    /// 运行多少个 tick
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// 每个 tick 的 wall-clock 步长（秒）
    #[arg(long, default_value_t = 0.05)]
    dt: f64,

    /// 仿真速度倍数
    #[arg(long)]
    speed: Option<f64>,

    /// 关闭自动发包
    #[arg(long)]
    no_auto_generate: bool,

    /// 节点队列容量（packet 个数）
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// 非空队列每 tick 出队的概率
    #[arg(long)]
    drain_probability: Option<f64>,

    /// 启动时注入 packet，格式 SRC:DST（可重复）
    #[arg(long, value_parser = parse_pair)]
    inject: Vec<(String, String)>,

    /// 启动时把节点置为强制拥塞（可重复）
    #[arg(long)]
    force_congest: Vec<String>,

    /// 每隔多少个 tick 打印一次统计
    #[arg(long)]
    stats_every: Option<u64>,

    /// 输出可视化帧 JSON
    #[arg(long)]
    viz_json: Option<PathBuf>,

    /// 每隔多少个 tick 采样一帧
    #[arg(long, default_value_t = 10)]
    viz_every: u64,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once(':') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a.to_string(), b.to_string())),
        _ => Err(format!("expected SRC:DST, got {raw:?}")),
    }
}

/// 分层配置：内置默认值 ← 拓扑文件 engine 段 ← 命令行参数
fn layered_config(doc: Option<&TopologyDocument>, args: &Args) -> EngineConfig {
    let mut cfg = doc
        .and_then(|d| d.engine.clone())
        .unwrap_or_default();
    if let Some(routing) = args.routing {
        cfg.routing = routing;
    }
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(speed) = args.speed {
        cfg.default_speed = speed;
    }
    if args.no_auto_generate {
        cfg.auto_generate = false;
    }
    if let Some(cap) = args.queue_capacity {
        cfg.queue_capacity = cap;
    }
    if let Some(p) = args.drain_probability {
        cfg.drain_probability = p;
    }
    cfg
}

fn print_stats(prefix: &str, s: &Statistics) {
    println!(
        "{prefix} t={:.3}s, generated={}, active={}, delivered={}, dropped={}, delivery_rate={:.1}%, avg_latency_ms={:.1}",
        s.simulation_time_s,
        s.total_generated,
        s.active,
        s.delivered,
        s.dropped,
        s.delivery_rate * 100.0,
        s.average_latency_ms
    );
}

fn main() {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let doc = args.topology.as_deref().and_then(|path| {
        read_document(path)
            .map_err(|err| warn!(error = %err, "拓扑文件不可用"))
            .ok()
    });
    let cfg = layered_config(doc.as_ref(), &args);
    let spec = doc.as_ref().and_then(|d| match &args.topology_name {
        Some(name) => d.by_name(name),
        None => d.by_index(args.topology_index),
    });
    let network = load_or_default(spec, cfg.queue_capacity);

    let mut engine = Engine::new(network, cfg);
    println!(
        "topology name={}, nodes={}, links={}, routing={}",
        engine.network().name,
        engine.network().node_count(),
        engine.network().link_count(),
        engine.routing_kind().as_str()
    );

    for id in &args.force_congest {
        if engine.toggle_force_congestion(&NodeId::from(id.as_str())).is_none() {
            warn!(node = %id, "未知节点，忽略强制拥塞");
        }
    }
    for (src, dst) in &args.inject {
        match engine.generate_packet(&NodeId::from(src.as_str()), &NodeId::from(dst.as_str())) {
            Some(id) => println!("injected pkt_id={id} {src}->{dst}"),
            None => println!("inject failed {src}->{dst}"),
        }
    }

    let mut viz = args.viz_json.as_ref().map(|_| VizLogger::default());
    engine.start();
    for tick in 1..=args.ticks {
        engine.update(args.dt);

        if let Some(every) = args.stats_every.filter(|n| *n > 0) {
            if tick % every == 0 {
                print_stats("stats", &engine.get_statistics());
            }
        }
        if let Some(v) = &mut viz {
            if args.viz_every > 0 && tick % args.viz_every == 0 {
                v.push(engine.viz_frame());
            }
        }
    }

    print_stats("done @", &engine.get_statistics());

    if let (Some(path), Some(v)) = (&args.viz_json, &viz) {
        let json = serde_json::to_string_pretty(&v.frames).expect("serialize viz frames");
        fs::write(path, json).expect("write viz json");
    }
}
