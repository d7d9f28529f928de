use cacheline_bfs::{
    bfs::{
        do_bfs, do_cacheline_bfs, do_pull_bfs, pick_sources, push_level_profile, ProbePolicy,
    },
    experiment::{compare_reordered, parent_stats, roots_to_go},
    graph::{simplify_graph, Builder, Graph},
    memory::{HitCost, Layout, Memory, MemoryConfig},
    record::{average, load_record, record_path},
};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use derive_more::Display;
use log::info;
use std::{
    error::Error,
    fs::File,
    io::BufWriter,
    path::Path,
    time::Instant,
};

#[derive(Debug, Display, PartialEq)]
enum Err {
    #[display(fmt = "invalid {}: {}", _0, _1)]
    InvalidArgument(&'static str, String),
    #[display(fmt = "BFS variants disagree from root {}", _0)]
    Mismatch(i32),
}

impl std::error::Error for Err {}

const TASKS: [&str; 4] = [
    "vertex_edge_visit",
    "reorder_vertex_edge_visit",
    "vertex_edge_visit_cacheline",
    "reorder_vertex_edge_visit_cacheline",
];

fn graph_arg() -> Arg<'static, 'static> {
    Arg::with_name("GRAPH").required(true)
}

fn symmetric_arg() -> Arg<'static, 'static> {
    Arg::with_name("symmetric")
        .long("symmetric")
        .short("s")
        .help("Treat every edge as undirected")
}

fn skip_malformed_arg() -> Arg<'static, 'static> {
    Arg::with_name("skip-malformed")
        .long("skip-malformed")
        .help("Warn about and drop unparsable lines instead of failing")
}

fn load_graph(matches: &ArgMatches) -> Result<Graph, Box<dyn Error>> {
    let time_now = Instant::now();
    let graph = Builder::new(matches.value_of("GRAPH").unwrap())
        .symmetric(matches.is_present("symmetric"))
        .skip_malformed(matches.is_present("skip-malformed"))
        .build_csr()?;
    info!("graph load: {} ms", time_now.elapsed().as_millis());
    info!("{}", graph.info());
    Ok(graph)
}

fn graph_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_owned(), |name| name.to_string_lossy().into_owned())
}

fn parse_policy(policy: &str) -> Result<ProbePolicy, Err> {
    match policy {
        "early-break" => Ok(ProbePolicy::EarlyBreak),
        "exhaustive" => Ok(ProbePolicy::Exhaustive),
        "discovered-only" => Ok(ProbePolicy::DiscoveredOnly),
        _ => Err(Err::InvalidArgument("policy", policy.to_owned())),
    }
}

fn parse_layout(layout: &str) -> Result<Layout, Err> {
    match layout {
        "plain" => Ok(Layout::Plain),
        "skip-isolated" => Ok(Layout::SkipIsolated),
        _ => Err(Err::InvalidArgument("layout", layout.to_owned())),
    }
}

fn parse_hit_cost(hit_cost: &str) -> Result<HitCost, Err> {
    match hit_cost {
        "0" => Ok(HitCost::Zero),
        "1" => Ok(HitCost::One),
        _ => Err(Err::InvalidArgument("hit cost", hit_cost.to_owned())),
    }
}

fn handle_stats(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(matches)?;
    println!("{}", graph.info());
    Ok(())
}

fn handle_cacheline(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(matches)?;
    let config = MemoryConfig {
        layout: parse_layout(matches.value_of("layout").unwrap())?,
        hit_cost: parse_hit_cost(matches.value_of("hit-cost").unwrap())?,
    };
    let policy = parse_policy(matches.value_of("policy").unwrap())?;
    let source_number: usize = matches.value_of("sources").unwrap().parse()?;
    let sources = pick_sources(&graph, source_number, &mut rand::thread_rng());
    if sources.is_empty() {
        println!("no vertex has out-edges");
        return Ok(());
    }
    print!("{}", compare_reordered(&graph, &sources, config, policy));
    Ok(())
}

fn handle_parent_stats(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(matches)?;
    let block_size: i32 = matches.value_of("block-size").unwrap().parse()?;
    let fraction: f64 = matches.value_of("fraction").unwrap().parse()?;
    let roots = roots_to_go(&graph, fraction);
    info!("roots to go: {}", roots);
    let path = record_path(
        matches.value_of("records").unwrap(),
        &graph_name(matches.value_of("GRAPH").unwrap()),
        "parent_cnt",
    );
    parent_stats(&graph, roots, block_size, &path)?;
    println!("{}", path.display());
    Ok(())
}

fn handle_analyze(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let dir = matches.value_of("records").unwrap();
    let name = matches.value_of("GRAPH_NAME").unwrap();
    let vertex_number: usize = matches.value_of("VERTEX_NUMBER").unwrap().parse()?;
    let tasks: Vec<&str> = match matches.values_of("TASK") {
        Some(tasks) => tasks.collect(),
        None => TASKS.to_vec(),
    };
    for task in tasks {
        let values = load_record(record_path(dir, name, task), vertex_number)?;
        println!("{}: {:.4}", task, average(&values, vertex_number));
    }
    Ok(())
}

fn handle_levels(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let graph = load_graph(matches)?;
    let root = match matches.value_of("root") {
        Some(root) => {
            let root: i32 = root.parse()?;
            if root < 0 || root as usize >= graph.vertex_number() {
                return Err(Err::InvalidArgument("root", root.to_string()).into());
            }
            root
        }
        None => match pick_sources(&graph, 1, &mut rand::thread_rng()).first() {
            Some(&root) => root,
            None => {
                println!("no vertex has out-edges");
                return Ok(());
            }
        },
    };
    info!("root: {}", root);
    let expected = do_bfs(&graph, root);
    let profiles = [
        ("Push (repeat)", push_level_profile(&graph, root, true)),
        ("Push", push_level_profile(&graph, root, false)),
        ("Pull", do_pull_bfs(&graph, root, false)),
        ("Pull Early Break", do_pull_bfs(&graph, root, true)),
    ];
    for (title, (_, stats)) in &profiles {
        println!("{}", title);
        stats.iter().for_each(|stat| println!("{}", stat));
        println!();
    }
    let mut memory = Memory::new(&graph);
    let agree = profiles.iter().all(|(_, (depth, _))| *depth == expected)
        && [
            ProbePolicy::EarlyBreak,
            ProbePolicy::Exhaustive,
            ProbePolicy::DiscoveredOnly,
        ]
        .iter()
        .all(|&policy| do_cacheline_bfs(&graph, root, &mut memory, policy).depth == expected);
    if !agree {
        println!("Verification: FAIL");
        return Err(Err::Mismatch(root).into());
    }
    println!("Verification: PASS");
    Ok(())
}

fn handle_simplify(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let graph = simplify_graph(load_graph(matches)?);
    info!("{}", graph.info());
    let out = BufWriter::new(File::create(matches.value_of("OUTPUT").unwrap())?);
    graph.write_edge_list(out)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let matches = App::new("cacheline-bfs")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .help("Worker threads, 0 for one per core"),
        )
        .subcommand(
            SubCommand::with_name("stats")
                .about("Print vertex and edge counts")
                .arg(graph_arg())
                .arg(symmetric_arg())
                .arg(skip_malformed_arg()),
        )
        .subcommand(
            SubCommand::with_name("cacheline")
                .about("Compare cacheline cost before and after degree reordering")
                .arg(graph_arg())
                .arg(symmetric_arg())
                .arg(skip_malformed_arg())
                .arg(
                    Arg::with_name("sources")
                        .long("sources")
                        .takes_value(true)
                        .default_value("64"),
                )
                .arg(
                    Arg::with_name("policy")
                        .long("policy")
                        .takes_value(true)
                        .possible_values(&["early-break", "exhaustive", "discovered-only"])
                        .default_value("early-break"),
                )
                .arg(
                    Arg::with_name("layout")
                        .long("layout")
                        .takes_value(true)
                        .possible_values(&["plain", "skip-isolated"])
                        .default_value("plain"),
                )
                .arg(
                    Arg::with_name("hit-cost")
                        .long("hit-cost")
                        .takes_value(true)
                        .possible_values(&["0", "1"])
                        .default_value("0"),
                ),
        )
        .subcommand(
            SubCommand::with_name("parent-stats")
                .about("Count BFS parents per vertex into a record file")
                .arg(graph_arg())
                .arg(symmetric_arg())
                .arg(skip_malformed_arg())
                .arg(
                    Arg::with_name("records")
                        .long("records")
                        .takes_value(true)
                        .required(true),
                )
                .arg(
                    Arg::with_name("block-size")
                        .long("block-size")
                        .takes_value(true)
                        .default_value("65536"),
                )
                .arg(
                    Arg::with_name("fraction")
                        .long("fraction")
                        .takes_value(true)
                        .default_value("0.005"),
                ),
        )
        .subcommand(
            SubCommand::with_name("analyze")
                .about("Average record files over all vertex pairs")
                .arg(
                    Arg::with_name("records")
                        .long("records")
                        .takes_value(true)
                        .required(true),
                )
                .arg(Arg::with_name("GRAPH_NAME").required(true))
                .arg(Arg::with_name("VERTEX_NUMBER").required(true))
                .arg(Arg::with_name("TASK").multiple(true)),
        )
        .subcommand(
            SubCommand::with_name("levels")
                .about("Print push and pull level profiles for one root")
                .arg(graph_arg())
                .arg(symmetric_arg())
                .arg(skip_malformed_arg())
                .arg(Arg::with_name("root").long("root").takes_value(true)),
        )
        .subcommand(
            SubCommand::with_name("simplify")
                .about("Remove parallel edges and write the result as an edge list")
                .arg(graph_arg())
                .arg(Arg::with_name("OUTPUT").required(true))
                .arg(symmetric_arg())
                .arg(skip_malformed_arg()),
        )
        .get_matches();
    if let Some(threads) = matches.value_of("threads") {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads.parse()?)
            .build_global()?;
    }
    match matches.subcommand() {
        ("stats", Some(matches)) => handle_stats(matches),
        ("cacheline", Some(matches)) => handle_cacheline(matches),
        ("parent-stats", Some(matches)) => handle_parent_stats(matches),
        ("analyze", Some(matches)) => handle_analyze(matches),
        ("levels", Some(matches)) => handle_levels(matches),
        ("simplify", Some(matches)) => handle_simplify(matches),
        _ => Ok(()),
    }
}
