use clap::{Args, Parser};

mod board;
mod demo;
mod plan;

#[derive(Parser, Debug)]
#[command(bin_name = "busmap", about = "Bus interconnect planner and demo runner")]
struct Cli {
    /// Most verbose log level to print.
    #[arg(short, long, global = true, default_value = "info")]
    log_level: log::LevelFilter,

    #[command(subcommand)]
    command: MainCommand,
}

#[derive(clap::Subcommand, Debug)]
enum MainCommand {
    /// Plan an address map and print its windows and match patterns.
    Plan(PlanCommand),
    /// Assemble a board's bus and run a few transactions through it.
    Demo(DemoCommand),
}

#[derive(Args, Debug)]
pub struct PlanCommand {
    /// Address bits of the parent space.
    #[arg(short = 'w', long, default_value_t = 32)]
    pub parent_bits: u32,

    /// Give every device a window of this many address bits.
    #[arg(short, long)]
    pub pad: Option<u32>,

    /// A device as KIND[@SECTION]:CAPACITY, e.g. `Uart@peripheral:regs=TX,RX` or `Ram:words=1024`.
    #[arg(short, long = "device")]
    pub devices: Vec<plan::DeviceSpec>,

    /// Plan the devices of a board preset instead.
    #[arg(short, long, conflicts_with = "devices")]
    pub board: Option<board::Board>,
}

#[derive(Args, Debug)]
pub struct DemoCommand {
    #[arg(short, long)]
    pub board: board::Board,
}

fn print_hook(args: core::fmt::Arguments) {
    println!("{}", args);
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    bus_logger::init_logger(cli.log_level)?;
    bus_logger::set_print_hook(print_hook);

    match cli.command {
        MainCommand::Plan(p) => plan::Planner::new(p)?.go(),
        MainCommand::Demo(d) => demo::Demo::new(d.board)?.go(),
    }
}
