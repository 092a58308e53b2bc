//! Shared fixtures for integration tests

#![allow(dead_code)]

use churn_sentinel::data::CustomerRecord;
use polars::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use std::path::Path;

fn pick<'a>(rng: &mut ChaCha8Rng, options: &[&'a str]) -> &'a str {
    options[rng.gen_range(0..options.len())]
}

/// Raw Telco-style table: identifier, text `TotalCharges` with blanks, 0/1 `SeniorCitizen`.
///
/// Short-tenure month-to-month fiber customers churn most of the time.
pub fn telco_frame(n: usize, seed: u64) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut ids = Vec::with_capacity(n);
    let mut gender = Vec::with_capacity(n);
    let mut senior = Vec::with_capacity(n);
    let mut partner = Vec::with_capacity(n);
    let mut dependents = Vec::with_capacity(n);
    let mut tenure = Vec::with_capacity(n);
    let mut phone = Vec::with_capacity(n);
    let mut lines = Vec::with_capacity(n);
    let mut internet = Vec::with_capacity(n);
    let mut security = Vec::with_capacity(n);
    let mut backup = Vec::with_capacity(n);
    let mut protection = Vec::with_capacity(n);
    let mut support = Vec::with_capacity(n);
    let mut tv = Vec::with_capacity(n);
    let mut movies = Vec::with_capacity(n);
    let mut contract = Vec::with_capacity(n);
    let mut paperless = Vec::with_capacity(n);
    let mut payment = Vec::with_capacity(n);
    let mut monthly = Vec::with_capacity(n);
    let mut total = Vec::with_capacity(n);
    let mut churn = Vec::with_capacity(n);

    for i in 0..n {
        ids.push(format!("{:04}-CUST", i));
        gender.push(pick(&mut rng, &["Female", "Male"]));
        senior.push(i64::from(rng.gen_bool(0.16)));
        partner.push(pick(&mut rng, &["Yes", "No"]));
        dependents.push(pick(&mut rng, &["Yes", "No"]));

        let t: i64 = if i % 25 == 0 { 0 } else { rng.gen_range(1..=72) };
        tenure.push(t);

        let has_phone = rng.gen_bool(0.9);
        phone.push(if has_phone { "Yes" } else { "No" });
        lines.push(if has_phone { pick(&mut rng, &["Yes", "No"]) } else { "No phone service" });

        let net = pick(&mut rng, &["DSL", "Fiber optic", "No"]);
        internet.push(net);
        let mut addon = || {
            if net == "No" {
                "No internet service"
            } else {
                pick(&mut rng, &["Yes", "No"])
            }
        };
        security.push(addon());
        backup.push(addon());
        protection.push(addon());
        support.push(addon());
        tv.push(addon());
        movies.push(addon());

        let c = pick(&mut rng, &["Month-to-month", "One year", "Two year"]);
        contract.push(c);
        paperless.push(pick(&mut rng, &["Yes", "No"]));
        payment.push(pick(
            &mut rng,
            &[
                "Electronic check",
                "Mailed check",
                "Bank transfer (automatic)",
                "Credit card (automatic)",
            ],
        ));

        let m: f64 = (rng.gen_range(18.0..118.0_f64) * 100.0).round() / 100.0;
        monthly.push(m);
        total.push(if t == 0 {
            " ".to_string()
        } else {
            format!("{:.2}", m * t as f64)
        });

        let risky = c == "Month-to-month" && t < 24;
        let p = if risky {
            if net == "Fiber optic" { 0.85 } else { 0.6 }
        } else {
            0.07
        };
        churn.push(if rng.gen_bool(p) { "Yes" } else { "No" });
    }

    df!(
        "customerID" => ids,
        "gender" => gender,
        "SeniorCitizen" => senior,
        "Partner" => partner,
        "Dependents" => dependents,
        "tenure" => tenure,
        "PhoneService" => phone,
        "MultipleLines" => lines,
        "InternetService" => internet,
        "OnlineSecurity" => security,
        "OnlineBackup" => backup,
        "DeviceProtection" => protection,
        "TechSupport" => support,
        "StreamingTV" => tv,
        "StreamingMovies" => movies,
        "Contract" => contract,
        "PaperlessBilling" => paperless,
        "PaymentMethod" => payment,
        "MonthlyCharges" => monthly,
        "TotalCharges" => total,
        "Churn" => churn
    )
    .unwrap()
}

pub fn write_csv(df: &DataFrame, path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(path).unwrap();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df.clone())
        .unwrap();
}

pub fn customer() -> CustomerRecord {
    CustomerRecord {
        gender: "Male".into(),
        senior_citizen: "No".into(),
        partner: "No".into(),
        dependents: "No".into(),
        tenure: 2.0,
        phone_service: "Yes".into(),
        multiple_lines: "No".into(),
        internet_service: "Fiber optic".into(),
        online_security: "No".into(),
        online_backup: "No".into(),
        device_protection: "No".into(),
        tech_support: "No".into(),
        streaming_tv: "Yes".into(),
        streaming_movies: "Yes".into(),
        contract: "Month-to-month".into(),
        paperless_billing: "Yes".into(),
        payment_method: "Electronic check".into(),
        monthly_charges: 99.65,
        total_charges: 199.3,
    }
}
