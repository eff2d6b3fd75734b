use chrono::NaiveDate;
use dts_core::{Amount, DateRange, TransactionType};
use dts_flows::{
    aggregate, cabinet_flow, drilldown, enrich, sum_amounts, Level, Selection, OTHER_LABEL, TGA_NODE,
};
use dts_import::{read_category_map, read_transactions, TransactionLoadOptions};
use rust_decimal_macros::dec;

const TRANSACTIONS: &str = "\
record_date,account_type,transaction_type,transaction_catg,transaction_catg_desc,transaction_today_amt
2024-01-05,Federal Reserve Account,Deposits,catgA,Taxes,2
2024-01-05,Federal Reserve Account,Withdrawals,catgB,Payroll,1.5
2024-01-06,Federal Reserve Account,Deposits,catgA,Taxes,0.5
";

const MAPPING: &str = "\
transaction_catg,transaction_catg_desc,cabinet_supercategory,agency_rollup,program_rollup
catgA,Taxes,Treasury,IRS,Withheld Taxes
catgB,Payroll,Defense,Army,Military Pay
";

fn full_range() -> Selection {
    Selection::new(
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        ),
        true,
    )
}

#[test]
fn three_rows_two_cabinets_end_to_end() {
    let transactions = read_transactions(TRANSACTIONS.as_bytes(), &TransactionLoadOptions::default()).unwrap();
    let mapping = read_category_map(MAPPING.as_bytes()).unwrap();
    let table = enrich(&transactions.records, &mapping);
    assert_eq!(table.len(), 3);

    let selection = full_range();
    let deposits = sum_amounts(
        selection.filter(table.records(), &[Level::Cabinet]),
        &TransactionType::Deposits,
        &[Level::Cabinet],
    );
    assert_eq!(deposits.len(), 1);
    assert_eq!(deposits[0].key, ["Treasury"]);
    assert_eq!(deposits[0].amount, Amount::from_decimal(dec!(2500000)));

    let withdrawals = sum_amounts(
        selection.filter(table.records(), &[Level::Cabinet]),
        &TransactionType::Withdrawals,
        &[Level::Cabinet],
    );
    assert_eq!(withdrawals.len(), 1);
    assert_eq!(withdrawals[0].key, ["Defense"]);
    assert_eq!(withdrawals[0].amount, Amount::from_decimal(dec!(1500000)));

    let cabinets = aggregate(table.records(), &selection, &[Level::Cabinet]);
    let graph = cabinet_flow(&cabinets).unwrap();
    assert_eq!(
        graph.nodes,
        vec!["Deposits: Treasury", TGA_NODE, "Withdrawals: Defense"]
    );
    assert_eq!(graph.sources, vec![0, 1]);
    assert_eq!(graph.targets, vec![1, 2]);
    assert_eq!(
        graph.values,
        vec![
            Amount::from_decimal(dec!(2500000)),
            Amount::from_decimal(dec!(1500000)),
        ]
    );
}

#[test]
fn node_count_matches_cabinets_on_each_side() {
    let transactions = "\
record_date,account_type,transaction_type,transaction_catg,transaction_catg_desc,transaction_today_amt
2024-03-01,Acct,Deposits,A,a,1
2024-03-01,Acct,Deposits,B,b,2
2024-03-01,Acct,Withdrawals,B,b,3
2024-03-01,Acct,Withdrawals,C,c,4
2024-03-01,Acct,Withdrawals,Z,z,5
";
    let mapping = "\
transaction_catg,transaction_catg_desc,cabinet_supercategory,agency_rollup,program_rollup
A,a,Commerce,Census,Surveys
B,b,Treasury,IRS,Taxes
C,c,Defense,Navy,Ships
";
    let table = enrich(
        &read_transactions(transactions.as_bytes(), &TransactionLoadOptions::default())
            .unwrap()
            .records,
        &read_category_map(mapping.as_bytes()).unwrap(),
    );
    let cabinets = aggregate(table.records(), &full_range(), &[Level::Cabinet]);
    let deposit_cabinets = cabinets.iter().filter(|c| c.deposits.is_positive()).count();
    let withdrawal_cabinets = cabinets.iter().filter(|c| c.withdrawals.is_positive()).count();
    assert_eq!((deposit_cabinets, withdrawal_cabinets), (2, 3));

    let graph = cabinet_flow(&cabinets).unwrap();
    assert_eq!(graph.nodes.len(), deposit_cabinets + 1 + withdrawal_cabinets);
    assert!(graph
        .sources
        .iter()
        .chain(&graph.targets)
        .all(|&i| i < graph.nodes.len()));
    assert!(graph.nodes.contains(&"Withdrawals: Unmapped".to_string()));

    let mapped_only = Selection::new(full_range().range, false);
    let graph = cabinet_flow(&aggregate(table.records(), &mapped_only, &[Level::Cabinet])).unwrap();
    assert!(!graph.nodes.iter().any(|n| n.contains("Unmapped")));
}

#[test]
fn drilldown_buckets_long_tail() {
    let mut transactions = String::from(
        "record_date,account_type,transaction_type,transaction_catg,transaction_catg_desc,transaction_today_amt\n",
    );
    let mut mapping = String::from(
        "transaction_catg,transaction_catg_desc,cabinet_supercategory,agency_rollup,program_rollup\n",
    );
    for (i, amount) in [10, 7, 5, 3, 1].iter().enumerate() {
        transactions.push_str(&format!("2024-05-01,Acct,Withdrawals,P{i},desc,{amount}\n"));
        mapping.push_str(&format!("P{i},desc,Defense,Army,Program {i}\n"));
    }

    let table = enrich(
        &read_transactions(transactions.as_bytes(), &TransactionLoadOptions::default())
            .unwrap()
            .records,
        &read_category_map(mapping.as_bytes()).unwrap(),
    );
    let d = drilldown(&table, &full_range(), "Defense", &TransactionType::Withdrawals, 2).unwrap();

    let leaves: Vec<(&str, &str, Amount)> = d
        .graph
        .links()
        .filter(|(source, _, _)| *source == "Agency: Army")
        .collect();
    assert_eq!(leaves.len(), 3);
    assert_eq!(leaves[0].1, "Program: Army → Program 0");
    assert_eq!(leaves[1].1, "Program: Army → Program 1");
    assert_eq!(leaves[2].1, format!("Program: Army → {OTHER_LABEL}"));
    assert_eq!(leaves[2].2, Amount::from_decimal(dec!(9000000)));
    assert_eq!(d.total, Amount::from_decimal(dec!(26000000)));
}
