use monthly_unit_cost::{MonthlyStatisticsProcessor, StatisticsConfig};
use std::fs;
use std::path::PathBuf;

const HEADER: &str = "month,Object,Qty,Amount,ProductCode,EntityCode";

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // A config path on the command line runs against real extracts.
    if let Some(path) = std::env::args().nth(1) {
        let config = StatisticsConfig::from_json_file(&PathBuf::from(path))?;
        let report = MonthlyStatisticsProcessor::run(&config)?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let workdir = tempfile::tempdir()?;
    let source = workdir.path().join("extracts");
    fs::create_dir(&source)?;

    let extracts = [
        (
            "2023-01.csv",
            vec![
                "1,a,2,10,0001B00400,0001B00400-S",
                "1,a,5,10,0001B00400,0001B00400-S",
                "1,b,4,0.049268,0001B00400,5120000104C",
            ],
        ),
        (
            "2023-04.csv",
            vec![
                "4,a,1,4,0001B00400,0001B00400-S",
                "4,c,0,12,0001B00400,5120000302",
            ],
        ),
        (
            "2023-08.csv",
            vec![
                "8,a,3,0.000141,0001B00700,A05150500323",
                "8,b,10,231.557030,X012-A63RV0-1,5120000302",
            ],
        ),
    ];

    for (name, lines) in &extracts {
        let mut body = String::from(HEADER);
        for line in lines {
            body.push('\n');
            body.push_str(line);
        }
        body.push('\n');
        fs::write(source.join(name), body)?;
    }

    let mut config = StatisticsConfig::new(&source);
    config.output_path = workdir.path().join("p.csv");
    config.include_monthly_columns = true;
    config.wide_output_path = Some(workdir.path().join("wide.csv"));

    let report = MonthlyStatisticsProcessor::run(&config)?;

    println!("Run report:");
    println!("{}", serde_json::to_string_pretty(&report)?);
    println!("\nWide table:");
    println!("{}", fs::read_to_string(workdir.path().join("wide.csv"))?);
    println!("Summary table:");
    println!("{}", fs::read_to_string(&config.output_path)?);

    Ok(())
}
