use clap::{arg, crate_version, Command};
use wkcodec::config::Config;
use wkcodec::pipeline::Pipeline;

const RCH: &str = "unreachable was reached";

fn parse_usize(cmd: &clap::ArgMatches, name: &str, default: usize) -> Result<usize, Box<dyn std::error::Error>> {
    match cmd.get_one::<String>(name) {
        Some(s) => Ok(s.parse::<usize>()?),
        None => Ok(default),
    }
}

fn build_pipeline(cmd: &clap::ArgMatches) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let method = cmd.get_one::<String>("method").expect(RCH);
    let word_size_bytes = parse_usize(cmd, "word-size", 8)?;
    let packing_word_bytes = parse_usize(cmd, "packing-size", 8)?;
    let dict_size = parse_usize(cmd, "dict-size", 16)?;
    let num_low_bits = parse_usize(cmd, "low-bits", 10)?;
    let debug = cmd.get_flag("debug");
    let config = Config::new(word_size_bytes, packing_word_bytes, dict_size, num_low_bits, debug)?;
    Ok(match method.as_str() {
        "wk" => Pipeline::wk_only(config)?,
        "wk-huffman" => Pipeline::wk_huffman(config)?,
        other => {
            eprintln!("{} not supported", other);
            return Err(Box::new(std::fmt::Error));
        }
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let long_help =
"Examples:
---------
Compress:      `wkcodec compress -m wk-huffman -i my_page -o my_page.wk`
Expand:        `wkcodec expand -m wk-huffman -i my_page.wk -o my_page`
Histogram:     `wkcodec histogram -i my_page.wk`";

    let methods = ["wk", "wk-huffman"];

    let codec_args = |cmd: Command| -> Command {
        cmd.arg(arg!(-m --method <METHOD> "compression pipeline").value_parser(methods).required(true))
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-o --output <PATH> "output path").required(true))
            .arg(arg!(-w --"word-size" <BYTES> "word size in bytes (4 or 8)").required(false))
            .arg(arg!(-k --"packing-size" <BYTES> "bit-packing granularity in bytes").required(false))
            .arg(arg!(-d --"dict-size" <ENTRIES> "recency dictionary size, a power of two").required(false))
            .arg(arg!(-l --"low-bits" <BITS> "number of low bits in the partial-match split").required(false))
            .arg(arg!(--debug "emit verbose per-word diagnostics").required(false))
    };

    let mut main_cmd = Command::new("wkcodec")
        .about("Compress and expand virtual-memory pages with the WK dictionary codec")
        .after_long_help(long_help)
        .version(crate_version!());
    main_cmd = main_cmd.subcommand(codec_args(Command::new("compress").about("compress a page")));
    main_cmd = main_cmd.subcommand(codec_args(Command::new("expand").about("expand a page")));
    main_cmd = main_cmd.subcommand(
        Command::new("histogram")
            .about("print the recency-dictionary index histogram for a compressed WK frame")
            .arg(arg!(-i --input <PATH> "input path").required(true))
            .arg(arg!(-d --"dict-size" <ENTRIES> "recency dictionary size, a power of two").required(false))
            .arg(arg!(-w --"word-size" <BYTES> "word size in bytes (4 or 8)").required(false))
            .arg(arg!(-k --"packing-size" <BYTES> "bit-packing granularity in bytes").required(false))
            .arg(arg!(-l --"low-bits" <BITS> "number of low bits in the partial-match split").required(false)),
    );

    let matches = main_cmd.get_matches();

    if let Some(cmd) = matches.subcommand_matches("compress") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let pipeline = build_pipeline(cmd)?;
        let dat = std::fs::read(path_in)?;
        let compressed = pipeline.compress(&dat)?;
        std::fs::write(path_out, compressed)?;
    }

    if let Some(cmd) = matches.subcommand_matches("expand") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let path_out = cmd.get_one::<String>("output").expect(RCH);
        let pipeline = build_pipeline(cmd)?;
        let dat = std::fs::read(path_in)?;
        let expanded = pipeline.decompress(&dat)?;
        std::fs::write(path_out, expanded)?;
    }

    if let Some(cmd) = matches.subcommand_matches("histogram") {
        let path_in = cmd.get_one::<String>("input").expect(RCH);
        let word_size_bytes = parse_usize(cmd, "word-size", 8)?;
        let packing_word_bytes = parse_usize(cmd, "packing-size", 8)?;
        let dict_size = parse_usize(cmd, "dict-size", 16)?;
        let num_low_bits = parse_usize(cmd, "low-bits", 10)?;
        let config = Config::new(word_size_bytes, packing_word_bytes, dict_size, num_low_bits, false)?;
        let wk = wkcodec::WKCodec::new(config)?;
        let dat = std::fs::read(path_in)?;
        let histogram = wk.dict_index_histogram(&dat)?;
        for (index, count) in histogram.iter().enumerate() {
            println!("{}\t{}", index, count);
        }
    }

    Ok(())
}
