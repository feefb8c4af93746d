//! Print exact finite-difference stencils and multistep coefficients.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;
use log::info;
use std::{
    io::{self, Write},
    ops::RangeInclusive,
    str::FromStr,
};
use stencils::{
    algebra::{ops, Symbol},
    derive_with, Config, Formula, Variant,
};

#[derive(Parser)]
#[command(
    name = "stencils",
    version,
    about = "Derive exact finite-difference stencils and multistep weights",
    after_help = r#"
Environment Variables:
  STENCILS_VARIANT=stencil     Which family of coefficients to derive
  STENCILS_ORDER=4             The order to derive
  STENCILS_LOG_LEVEL=debug     Set log level (error, warn, info, debug, trace)
"#
)]
struct Cli {
    /// Which family of coefficients to derive
    #[arg(
        long,
        env = "STENCILS_VARIANT",
        default_value = "stencil",
        value_parser = Variant::from_str
    )]
    variant: Variant,

    /// The order of the formula
    #[arg(long, env = "STENCILS_ORDER", default_value_t = 4)]
    order: usize,

    /// Also derive every order up to (and including) this one
    #[arg(long, value_name = "ORDER")]
    up_to: Option<usize>,

    /// Print the matrix after every elimination step
    #[arg(long)]
    transcript: bool,

    /// Print the exact weight of each sample, and its value when h = 1
    #[arg(long)]
    weights: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Set log level
    #[arg(
        long,
        value_enum,
        env = "STENCILS_LOG_LEVEL",
        default_value = "warn"
    )]
    log_level: LogLevel,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        log::LevelFilter::Debug
    } else {
        cli.log_level.into()
    };

    env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .filter_level(log_level)
        .init();

    info!("stencils v{} starting", env!("CARGO_PKG_VERSION"));

    let stdout = io::stdout();
    derive_all(&cli, &mut stdout.lock())
}

/// Every order requested on the command line, in increasing order.
fn orders(first: usize, up_to: Option<usize>) -> Result<RangeInclusive<usize>> {
    let last = up_to.unwrap_or(first);
    if last < first {
        bail!("--up-to {} is below --order {}", last, first);
    }

    Ok(first..=last)
}

fn derive_all<W: Write>(cli: &Cli, out: &mut W) -> Result<()> {
    for order in orders(cli.order, cli.up_to)? {
        let config = Config::new(order, cli.variant);

        run(&config, cli, out).with_context(|| {
            format!(
                "Unable to derive the order {} {} formula",
                order, config.variant
            )
        })?;
    }

    Ok(())
}

fn run<W: Write>(config: &Config, cli: &Cli, out: &mut W) -> Result<()> {
    writeln!(out, "Order = {}", config.order)?;

    let mut written = Ok(());
    let formula = derive_with(config, |step| {
        if cli.transcript && written.is_ok() {
            written = writeln!(out, "{}", step);
        }
    })?;
    written.context("Unable to write the transcript")?;

    writeln!(out, "{} = {}", formula.variant().target(), formula)?;

    if cli.weights {
        print_weights(&formula, out)?;
    }

    Ok(())
}

fn print_weights<W: Write>(formula: &Formula, out: &mut W) -> Result<()> {
    let h_is_one = |symbol: &Symbol| {
        if symbol.name() == "h" {
            Some(1.0)
        } else {
            None
        }
    };

    for (sample, weight) in formula.weights()? {
        let value = ops::evaluate(&weight, &h_is_one).with_context(|| {
            format!("Unable to evaluate the weight of {}", sample)
        })?;
        writeln!(out, "  {}\t{}\t{:.6}", sample, weight, value)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn output(args: &[&str]) -> Result<String> {
        let cli = Cli::try_parse_from(
            std::iter::once("stencils").chain(args.iter().copied()),
        )?;
        let mut out = Vec::new();

        derive_all(&cli, &mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn second_order_stencil_transcript() {
        let got = output(&["--order", "2", "--transcript"]).unwrap();

        let headings: Vec<_> = got
            .lines()
            .filter(|line| !line.contains('\t'))
            .filter(|line| *line != "[" && *line != "]")
            .collect();
        assert_eq!(
            headings,
            [
                "Order = 2",
                "Initial Matrix",
                "Round 0: normalised",
                "Round 0: eliminated",
                "Round 0: back-substituted",
                "f'_0 = (3*f_0 - 4*f_1 + f_2)/(2*h)",
            ]
        );
        let first_row = got.lines().nth(3).unwrap();
        assert_eq!(first_row, "-f_0 + f_2\t-2*f'_0*h\t4\t");
    }

    #[test]
    fn formula_only_by_default() {
        let got = output(&["--order", "2"]).unwrap();

        assert_eq!(got, "Order = 2\nf'_0 = (3*f_0 - 4*f_1 + f_2)/(2*h)\n");
    }

    #[test]
    fn weights_table() {
        let got = output(&["--order", "2", "--weights"]).unwrap();

        let weights: Vec<_> = got.lines().skip(2).collect();
        assert_eq!(
            weights,
            [
                "  f_0\t3/(2*h)\t1.500000",
                "  f_1\t-2/h\t-2.000000",
                "  f_2\t1/(2*h)\t0.500000",
            ]
        );
    }

    #[test]
    fn sweep_every_order_up_to_the_last() {
        let got = output(&["--order", "2", "--up-to", "3"]).unwrap();

        let banners: Vec<_> = got
            .lines()
            .filter(|line| line.starts_with("Order = "))
            .collect();
        assert_eq!(banners, ["Order = 2", "Order = 3"]);
    }

    #[test]
    fn up_to_below_order_is_rejected() {
        let err = output(&["--order", "4", "--up-to", "3"]).unwrap_err();

        assert_eq!(err.to_string(), "--up-to 3 is below --order 4");
    }

    #[test]
    fn unknown_variants_are_rejected() {
        let got = Cli::try_parse_from(["stencils", "--variant", "adams"]);

        assert!(got.is_err());
    }

    #[test]
    fn variants_are_case_insensitive() {
        let args = ["stencils", "--variant", "Multistep"];

        let cli = Cli::try_parse_from(args).unwrap();

        assert_eq!(cli.variant, Variant::Multistep);
    }
}
