use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use partogram_core::{
    backdate_policy_from_env_value, CoreConfig, FileStore, LaborService, LaborStore,
    MeasurementId, NewMeasurement, NewPatient, PatientFilter, PatientId, SystemClock,
    TimerQueryService, TimerState, DEFAULT_DATA_DIR,
};
use partogram_types::{BodyTemperature, CervicalDilation, FetalHeartRate, MaternalPulse, NonEmptyText};

#[derive(Parser)]
#[command(name = "partogram")]
#[command(about = "Maternity ward labor timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List all patients with their timer states
    List {
        /// Filter by name substring
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one patient's timer state and measurement history
    Show {
        /// Patient id
        patient_id: String,
    },
    /// Admit a patient
    Admit {
        /// Patient full name
        full_name: String,
        /// Admission date (YYYY-MM-DD)
        admission_date: NaiveDate,
        /// Case history number (optional)
        #[arg(long)]
        history_number: Option<String>,
        /// Gestational age in weeks (optional)
        #[arg(long)]
        gestational_age: Option<u32>,
        /// Free-form notes (optional)
        #[arg(long)]
        notes: Option<String>,
    },
    /// Record a partogram measurement (starts labor on the first entry)
    Record {
        /// Patient id
        patient_id: String,
        /// Clinical time of the measurement (RFC 3339; defaults to now)
        #[arg(long)]
        time: Option<DateTime<Utc>>,
        /// Cervical dilation in cm (0-10)
        #[arg(long)]
        dilation: Option<i64>,
        /// Fetal heart rate in bpm
        #[arg(long)]
        fhr: Option<i64>,
        /// Maternal pulse in bpm
        #[arg(long)]
        pulse: Option<i64>,
        /// Temperature in °C
        #[arg(long)]
        temperature: Option<f64>,
        /// Blood pressure, e.g. 120/80
        #[arg(long)]
        blood_pressure: Option<String>,
    },
    /// Complete labor for a patient
    Complete {
        /// Patient id
        patient_id: String,
    },
    /// Delete a single measurement
    DeleteMeasurement {
        /// Patient id
        patient_id: String,
        /// Measurement id
        measurement_id: String,
    },
}

fn format_remaining(timer: &TimerState) -> String {
    if timer.status != partogram_core::LaborStatus::InProgress {
        return "--:--".into();
    }
    let minutes = timer.remaining_seconds / 60;
    let seconds = timer.remaining_seconds % 60;
    format!("{minutes:02}:{seconds:02}")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let data_dir =
        std::env::var("PARTOGRAM_DATA_DIR").unwrap_or_else(|_| DEFAULT_DATA_DIR.into());
    let backdate_policy =
        backdate_policy_from_env_value(std::env::var("PARTOGRAM_STRICT_TIME_ORDER").ok())?;
    let cfg = Arc::new(CoreConfig::new(data_dir.clone().into(), backdate_policy)?);
    let store: Arc<dyn LaborStore> = Arc::new(FileStore::open(data_dir)?);
    let clock = Arc::new(SystemClock);
    let labor = LaborService::new(store.clone(), clock.clone(), cfg);
    let query = TimerQueryService::new(store, clock);

    match cli.command {
        Some(Commands::List { search }) => {
            let views = query.patients(&PatientFilter {
                search,
                ..Default::default()
            })?;
            if views.is_empty() {
                println!("No patients found.");
            } else {
                for view in views {
                    println!(
                        "ID: {}  {}  [{}]  period {}  next due in {}",
                        view.patient.id,
                        view.patient.full_name,
                        view.patient.status,
                        view.timer.period,
                        format_remaining(&view.timer),
                    );
                }
            }
        }
        Some(Commands::Show { patient_id }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            let view = query.timer_state(patient_id)?;
            println!("{} [{}]", view.patient.full_name, view.patient.status);
            println!("  admitted:    {}", view.patient.admission_date);
            if let Some(labor_start) = view.patient.labor_start {
                println!("  labor start: {labor_start}");
            }
            println!("  period:      {}", view.timer.period);
            println!("  interval:    {} min", view.timer.interval_minutes);
            println!("  remaining:   {}", format_remaining(&view.timer));
            if let Some(next_due) = view.timer.next_due_at {
                println!("  next due at: {next_due}");
            }

            let measurements = query.measurements(patient_id)?;
            println!("  measurements: {}", measurements.len());
            for m in measurements {
                let dilation = m
                    .cervical_dilation
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".into());
                let fhr = m
                    .fetal_heart_rate
                    .map(|r| format!("{} bpm", r.bpm()))
                    .unwrap_or_else(|| "-".into());
                println!("    {}  id={}  dilation={}  fhr={}", m.time, m.id, dilation, fhr);
            }
        }
        Some(Commands::Admit {
            full_name,
            admission_date,
            history_number,
            gestational_age,
            notes,
        }) => {
            let mut new_patient =
                NewPatient::new(NonEmptyText::new(&full_name)?, admission_date);
            new_patient.history_number = history_number;
            new_patient.gestational_age = gestational_age;
            new_patient.notes = notes;

            let patient = labor.admit_patient(new_patient)?;
            println!("Admitted {} with id {}", patient.full_name, patient.id);
        }
        Some(Commands::Record {
            patient_id,
            time,
            dilation,
            fhr,
            pulse,
            temperature,
            blood_pressure,
        }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            let mut draft = NewMeasurement::at(time.unwrap_or_else(Utc::now));
            draft.cervical_dilation = dilation.map(CervicalDilation::new).transpose()?;
            draft.fetal_heart_rate = fhr.map(FetalHeartRate::new).transpose()?;
            draft.maternal_pulse = pulse.map(MaternalPulse::new).transpose()?;
            draft.temperature = temperature.map(BodyTemperature::new).transpose()?;
            draft.blood_pressure = blood_pressure;

            let outcome = labor.record_measurement(patient_id, draft)?;
            if outcome.labor_started {
                println!("Labor started.");
            }
            println!(
                "Recorded {}. Period {}, next measurement due in {}.",
                outcome.measurement.id,
                outcome.timer.period,
                format_remaining(&outcome.timer),
            );
        }
        Some(Commands::Complete { patient_id }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            let patient = labor.complete_labor(patient_id)?;
            println!("{} is now: {}", patient.full_name, patient.status);
        }
        Some(Commands::DeleteMeasurement {
            patient_id,
            measurement_id,
        }) => {
            let patient_id = PatientId::parse(&patient_id)?;
            let measurement_id = MeasurementId::parse(&measurement_id)?;
            labor.delete_measurement(patient_id, measurement_id)?;
            println!("Measurement deleted. Timer will recompute from the new latest entry.");
        }
        None => {
            println!("No command given. Try `partogram list`.");
        }
    }

    Ok(())
}
