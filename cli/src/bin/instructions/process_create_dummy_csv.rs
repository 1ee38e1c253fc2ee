use csv::Writer;

use crate::*;

pub fn process_create_dummy_csv(csv_args: &CreateDummyCsvArgs) -> Result<()> {
    let mut wtr = Writer::from_path(&csv_args.csv_path)?;
    wtr.write_record(["recipient", "amount"])?;

    for _ in 0..csv_args.num_records {
        wtr.write_record([
            Pubkey::new_unique().to_string(),
            csv_args.amount.to_string(),
        ])?;
    }

    wtr.flush()?;
    println!(
        "wrote {} synthetic payouts to {}",
        csv_args.num_records,
        csv_args.csv_path.display()
    );
    Ok(())
}
