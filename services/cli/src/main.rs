use itr_engine_cli::{run, Outcome};

fn main() {
    match run() {
        Ok(Outcome::Completed) => {}
        Ok(Outcome::SubmissionBlocked) => std::process::exit(2),
        Err(err) => {
            eprintln!("application error: {err}");
            std::process::exit(1);
        }
    }
}
