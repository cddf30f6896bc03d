use chrono::NaiveDate;
use ledger_insights::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn main() {
    println!("📊 Ledger Insights Demo\n");
    println!("Two accounts, one of them idle for a month, plus an internal transfer.");
    println!("Idle accounts keep their last balance; transfers move balances but not totals.\n");

    let accounts = vec![
        Account::new("chk", "Checking").with_transactions(vec![
            // Export lists same-day entries in arbitrary order
            Transaction::new(d(2024, 1, 2), -950.0, 1850.0)
                .with_tag(Tag::new("housing").with_sub_category("rent")),
            Transaction::new(d(2024, 1, 2), 2800.0, 2800.0)
                .with_tag(Tag::new("salary").with_sub_category("acme")),
            Transaction::new(d(2024, 1, 18), -64.3, 1785.7)
                .with_tag(Tag::new("food").with_sub_category("groceries")),
            Transaction::new(d(2024, 1, 25), -500.0, 1285.7)
                .with_tag(Tag::new("transfer").ignored()),
            Transaction::new(d(2024, 3, 1), 2800.0, 4085.7)
                .with_tag(Tag::new("salary").with_sub_category("acme")),
            Transaction::new(d(2024, 3, 4), -9.99, 4075.71)
                .with_tag(Tag::new("subscriptions").with_sub_category("video")),
        ]),
        Account::new("sav", "Savings").with_transactions(vec![
            Transaction::new(d(2024, 1, 25), 500.0, 500.0)
                .with_tag(Tag::new("transfer").ignored()),
            Transaction::new(d(2024, 2, 29), 1.25, 501.25).with_tag(Tag::new("interest")),
        ]),
    ];

    let processor = match InsightsProcessor::new(InsightsConfig::default()) {
        Ok(processor) => processor,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            return;
        }
    };

    println!("🔗 Reconstructed chains:");
    for account in &accounts {
        match processor.reconstruct_chain(&account.transactions) {
            Ok(outcome) => {
                println!("  {}:", account.name);
                for tx in &outcome.ordered {
                    println!(
                        "    {}  {:>9.2} -> {:>9.2}",
                        tx.booking_date, tx.amount, tx.balance_after
                    );
                }
                for warning in &outcome.warnings {
                    println!("    ⚠️  {}", warning);
                }
            }
            Err(chain_break) => eprintln!("  ❌ {}: {}", account.name, chain_break),
        }
    }

    let insights = processor.aggregate(&accounts);

    println!("\n📅 Monthly:");
    for month in &insights.monthly {
        println!(
            "  {}: income ${:>9.2}  expense ${:>9.2}  balance ${:>9.2} -> ${:>9.2}",
            month.key,
            month.stats.income,
            month.stats.expense,
            month.stats.balance_before,
            month.stats.balance_after
        );
    }

    println!("\n📊 Overall:");
    println!("  Income:  ${:>10.2}", insights.overall.totals.income);
    println!("  Expense: ${:>10.2}", insights.overall.totals.expense);
    println!(
        "  Average per month: income ${:.2}, expense ${:.2}",
        insights.overall.avg_per_month.income, insights.overall.avg_per_month.expense
    );

    match TimeRange::parse("2024-03") {
        Ok(range) => {
            let march = processor.filter_by_range(&insights, &range);
            println!("\n🔎 March only:");
            println!("  Income:  ${:>10.2}", march.overall.totals.income);
            println!("  Expense: ${:>10.2}", march.overall.totals.expense);
            println!(
                "  Balance: ${:.2} -> ${:.2}",
                march.overall.totals.balance_before, march.overall.totals.balance_after
            );
        }
        Err(e) => eprintln!("❌ Error: {}", e),
    }

    match processor.category_insights(&accounts) {
        Ok(categories) => {
            println!("\n🏷️  Expense categories:");
            for (name, stats) in categories.expense.by_amount() {
                println!(
                    "  {:<10} ${:>9.2} ({:>5.1}%)",
                    name,
                    stats.amount,
                    stats.ratio_of_total * 100.0
                );
                for (sub_name, sub) in &stats.subcategories {
                    println!("    {:<22} ${:>9.2}", sub_name, sub.amount);
                }
            }
            for warning in &categories.warnings {
                println!("  ⚠️  {}", warning);
            }
        }
        Err(e) => eprintln!("❌ Error: {}", e),
    }

    let history = processor.balance_history(&accounts);
    println!("\n💰 Balance history:");
    for point in &history.points {
        println!("  {}: ${:>10.2}", point.date, point.balance);
    }

    println!("\n✅ Verification:");
    let carried = insights
        .monthly
        .windows(2)
        .all(|pair| (pair[1].stats.balance_before - pair[0].stats.balance_after).abs() < 0.01);
    println!("  Month balances chain without gaps: {}", carried);
    println!("  Balance history complete: {}", history.is_complete());
}
