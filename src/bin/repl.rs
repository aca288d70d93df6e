use roll_expr::{eval_template, eval_value, Value};
use std::collections::HashMap;
use std::io::{self, BufRead, Write};

// `text <template>` evaluates a template body, `bf <expr>` turns big-fail marking on.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut vars: HashMap<String, Value> = HashMap::new();
    print!("> ");
    io::stdout().flush()?;
    while let Some(Ok(line)) = lines.next() {
        let line = line.trim();
        if let Some(text) = line.strip_prefix("text ") {
            match eval_template(text, &mut vars) {
                Ok((text, trace)) => println!("{}\n  [{}]", text, trace),
                Err(why) => eprintln!("Error: {}", why),
            }
        } else if !line.is_empty() {
            let (source, big_fail) = match line.strip_prefix("bf ") {
                Some(rest) => (rest, true),
                None => (line, false),
            };
            match eval_value(source, &mut vars, big_fail) {
                Ok(eval) => {
                    let fail = if eval.big_fail { " (big fail!)" } else { "" };
                    println!("{}{}\n  [{}]", eval.value, fail, eval.detail());
                }
                Err(why) => eprintln!("Error: {}", why),
            }
        }
        print!("> ");
        io::stdout().flush()?;
    }
    Ok(())
}
