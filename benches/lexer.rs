//! Lexer benchmarks
//!
//! Run with: cargo bench --bench lexer
//! Profile with: cargo flamegraph --bench lexer -- --bench

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use esparse::lexer::Lexer;

fn lex_all(source: &str) {
    let mut lexer = Lexer::new(black_box(source));
    loop {
        match lexer.next_token() {
            Ok(token) => {
                if token.is_eof() {
                    break;
                }
                black_box(&token);
            }
            Err(_) => break,
        }
    }
}

/// Simple expression
const SIMPLE_EXPR: &str = "1 + 2 * 3 - 4 / 5";

/// Variable declarations
const VARIABLES: &str = r#"
let x = 1;
const y = 2;
var z = 3;
let a = x + y + z;
const b = a * 2;
"#;

/// String literals with escapes
const STRINGS: &str = r#"
const hello = "Hello, World!";
const escaped = "Line1\nLine2\tTabbed";
const unicode = "\u{1F600} emoji A";
const template = `Hello ${name}!`;
"#;

/// Operators stress test
const OPERATORS: &str = r#"
a + b - c * d / e % f ** g
x === y !== z == w != v
a && b || c
a & b | c ^ d ~ e
a << 2 >> 3 >>> 4
a += b -= c *= d /= e %= f **= g
a < b <= c > d >= e
++x --y x++ y--
...rest
"#;

/// Class definition
const CLASS_DEF: &str = r#"
class Counter extends Base {
    constructor(name, initialValue = 0) {
        super();
        this.name = name;
        this.count = initialValue;
    }

    get value() {
        return this.count;
    }

    set value(n) {
        if (n >= 0) {
            this.count = n;
        }
    }

    increment() {
        this.count++;
        return this;
    }

    static create(name) {
        return new Counter(name);
    }
}
"#;

/// Functions with various parameter patterns
const FUNCTIONS: &str = r#"
function simple(a, b) { return a + b; }
function defaultParams(x = 1, y = 2) { return x + y; }
function restParams(...args) { return args.reduce((a, b) => a + b, 0); }
function destructured({ x, y }, [a, b]) { return x + y + a + b; }
const arrow = x => x * 2;
const arrowBlock = (x, y) => { return x * y; };
async function asyncFn() { return await Promise.resolve(42); }
function* generator() { yield 1; yield 2; yield 3; }
"#;

/// Control flow
const CONTROL_FLOW: &str = r#"
if (condition) {
    doSomething();
} else if (otherCondition) {
    doSomethingElse();
} else {
    doDefault();
}

for (let i = 0; i < 10; i++) {
    console.log(i);
}

for (const item of items) {
    process(item);
}

while (running) {
    tick();
}

switch (value) {
    case 1:
        handleOne();
        break;
    default:
        handleDefault();
}

try {
    riskyOperation();
} catch (error) {
    handleError(error);
} finally {
    cleanup();
}
"#;

/// JSON-like object literals
const OBJECTS: &str = r#"
const config = {
    name: "MyApp",
    version: "1.0.0",
    settings: {
        debug: true,
        logLevel: "info",
        features: ["auth", "api", "cache"],
    },
    endpoints: [
        { path: "/api/users", method: "GET" },
        { path: "/api/users/:id", method: "DELETE" },
    ],
};
"#;

/// Numbers in various formats
const NUMBERS: &str = r#"
const decimal = 42;
const float = 3.14159;
const scientific = 6.022e23;
const hex = 0xFF;
const octal = 0o755;
const binary = 0b1010;
"#;

/// Comments stress test
const COMMENTS: &str = r#"
// Single line comment
const a = 1; // inline comment

/* Multi-line
   comment
   spanning
   multiple lines */
const b = 2;

/**
 * JSDoc style comment
 * @param x The first parameter
 * @returns The doubled value
 */
function double(x) {
    return x * 2;
}
"#;

fn generate_large_source(size: usize) -> String {
    let mut source = String::with_capacity(size);
    let patterns = [CLASS_DEF, FUNCTIONS, CONTROL_FLOW, OBJECTS, NUMBERS];

    let mut i = 0;
    while source.len() < size {
        if let Some(pattern) = patterns.get(i % patterns.len()) {
            source.push_str(pattern);
            source.push_str("\n\n");
        }
        i += 1;
    }
    source
}

fn bench_lexer_individual(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/individual");

    let cases = [
        ("simple_expr", SIMPLE_EXPR),
        ("variables", VARIABLES),
        ("strings", STRINGS),
        ("operators", OPERATORS),
        ("class_def", CLASS_DEF),
        ("functions", FUNCTIONS),
        ("control_flow", CONTROL_FLOW),
        ("objects", OBJECTS),
        ("numbers", NUMBERS),
        ("comments", COMMENTS),
    ];

    for (name, source) in cases {
        group.throughput(Throughput::Bytes(source.len() as u64));
        group.bench_with_input(BenchmarkId::new("bytes", name), source, |b, s| {
            b.iter(|| lex_all(s));
        });
    }

    group.finish();
}

fn bench_lexer_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/throughput");

    let sizes = [1_000, 10_000, 100_000, 500_000];

    for size in sizes {
        let source = generate_large_source(size);
        let actual_size = source.len();

        group.throughput(Throughput::Bytes(actual_size as u64));
        group.bench_with_input(
            BenchmarkId::new("large_source", format!("{}KB", actual_size / 1024)),
            &source,
            |b, s| {
                b.iter(|| lex_all(s));
            },
        );
    }

    group.finish();
}

fn bench_lexer_token_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("lexer/token_types");

    let identifiers = "foo bar baz qux let const var function class async await yield of static";
    group.bench_function("identifiers_keywords", |b| {
        b.iter(|| lex_all(identifiers));
    });

    let numbers = "1 2 3 42 3.14 1e10 0xFF 0o755 0b1010 .5 2E-2";
    group.bench_function("numbers", |b| {
        b.iter(|| lex_all(numbers));
    });

    let strings = r#""hello" 'world' "escaped\n\t" "unicodeA" `template`"#;
    group.bench_function("strings", |b| {
        b.iter(|| lex_all(strings));
    });

    let operators = "+ - * / % ** ++ -- = == === != !== < <= > >= << >> >>> & && | || ^ ~ ! ? => ...";
    group.bench_function("operators", |b| {
        b.iter(|| lex_all(operators));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_lexer_individual,
    bench_lexer_throughput,
    bench_lexer_token_types,
);
criterion_main!(benches);
