use netutil::{setup_logger, CmdArgs, Timer};
use osm2net::{convert, Options};
use raw_net::AgentType;

fn main() {
    let mut args = CmdArgs::new();
    let mut opts = Options::new(args.required("--osm"), args.required("--output"));
    if let Some(agents) = args.optional("--agents") {
        opts.allowed_agents = agents
            .split(',')
            .map(|name| {
                AgentType::parse(name).unwrap_or_else(|| panic!("Unknown agent type {}", name))
            })
            .collect();
    }
    opts.separate_bike_walk_lanes = args.enabled("--bike-walk-lanes");
    let verbose = args.enabled("--verbose");
    args.done();

    setup_logger(verbose);

    let mut timer = Timer::new(&format!("generate {}", opts.output));
    let network = match convert(&opts, &mut timer) {
        Ok(network) => network,
        Err(err) => {
            eprintln!("Conversion failed: {:#}", err);
            std::process::exit(1);
        }
    };

    timer.start("export CSV");
    if let Err(err) = network.export_csv(&opts.output) {
        eprintln!("Export failed: {:#}", err);
        std::process::exit(1);
    }
    timer.stop("export CSV");

    println!(
        "macro: {} nodes / {} links / {} movements; meso: {} nodes / {} links; micro: {} nodes / {} links",
        network.macro_net.nodes.len(),
        network.macro_net.links.len(),
        network.macro_net.movements.len(),
        network.meso_net.nodes.len(),
        network.meso_net.links.len(),
        network.micro_net.nodes.len(),
        network.micro_net.links.len(),
    );
    timer.done();
}
