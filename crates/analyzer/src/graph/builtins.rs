//! The built-in signature library: the classes, modules and method
//! signatures every Ruby program can rely on without requiring anything.
//!
//! The library is pure data. [`BuiltinLibrary::standard`] builds the
//! declarative tables once; [`BuiltinLibrary::seed`] replays them into a
//! fresh graph before a source is walked, so every compilation unit gets
//! its own mutable copy while the library itself stays immutable and can
//! be shared across worker threads. Variadic or unknowable arities are
//! declared with a rest parameter so the argument-count analysis never
//! reports a builtin call it cannot see the real signature of.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{DefKind, Definition, DefinitionGraph, DefinitionId};

/// Positional arity of a built-in method.
#[derive(Debug, Clone, Copy)]
pub struct Sig {
    pub required: u8,
    pub optional: u8,
    pub rest: bool,
}

impl Sig {
    pub const NONE: Sig = Sig {
        required: 0,
        optional: 0,
        rest: false,
    };
    pub const ONE: Sig = Sig::req(1);
    pub const TWO: Sig = Sig::req(2);
    pub const REST: Sig = Sig {
        required: 0,
        optional: 0,
        rest: true,
    };

    pub const fn req(required: u8) -> Sig {
        Sig {
            required,
            optional: 0,
            rest: false,
        }
    }

    pub const fn opt(required: u8, optional: u8) -> Sig {
        Sig {
            required,
            optional,
            rest: false,
        }
    }

    pub const fn at_least(required: u8) -> Sig {
        Sig {
            required,
            optional: 0,
            rest: true,
        }
    }
}

type Methods = &'static [(&'static str, Sig)];

struct BuiltinClass {
    name: &'static str,
    /// Ignored for modules; classes other than `BasicObject` default to
    /// `Object` when absent.
    superclass: Option<&'static str>,
    module: bool,
    includes: &'static [&'static str],
    instance_methods: Methods,
    class_methods: Methods,
    /// Constants filed under this class, each an instance of the named
    /// builtin (for example `Math::PI` as a `Float`).
    constants: &'static [(&'static str, &'static str)],
}

const NO_METHODS: Methods = &[];

const BLANK: BuiltinClass = BuiltinClass {
    name: "",
    superclass: None,
    module: false,
    includes: &[],
    instance_methods: NO_METHODS,
    class_methods: NO_METHODS,
    constants: &[],
};

const KERNEL_INSTANCE: Methods = &[
    ("puts", Sig::REST),
    ("print", Sig::REST),
    ("p", Sig::REST),
    ("pp", Sig::REST),
    ("printf", Sig::at_least(1)),
    ("format", Sig::at_least(1)),
    ("sprintf", Sig::at_least(1)),
    ("gets", Sig::opt(0, 1)),
    ("require", Sig::ONE),
    ("require_relative", Sig::ONE),
    ("load", Sig::opt(1, 1)),
    ("raise", Sig::opt(0, 3)),
    ("fail", Sig::opt(0, 3)),
    ("loop", Sig::NONE),
    ("rand", Sig::opt(0, 1)),
    ("srand", Sig::opt(0, 1)),
    ("sleep", Sig::opt(0, 1)),
    ("exit", Sig::opt(0, 1)),
    ("exit!", Sig::opt(0, 1)),
    ("abort", Sig::opt(0, 1)),
    ("at_exit", Sig::NONE),
    ("catch", Sig::opt(0, 1)),
    ("throw", Sig::opt(1, 1)),
    ("proc", Sig::NONE),
    ("lambda", Sig::NONE),
    ("binding", Sig::NONE),
    ("block_given?", Sig::NONE),
    ("caller", Sig::opt(0, 2)),
    // The front end drops the operand of `defined?`, so zero given
    // arguments must stay legal.
    ("defined?", Sig::opt(0, 1)),
    ("system", Sig::at_least(1)),
    ("exec", Sig::at_least(1)),
    ("spawn", Sig::at_least(1)),
    ("warn", Sig::REST),
];

const BASIC_OBJECT_INSTANCE: Methods = &[
    ("initialize", Sig::NONE),
    ("==", Sig::ONE),
    ("!=", Sig::ONE),
    ("!", Sig::NONE),
    ("equal?", Sig::ONE),
    ("instance_eval", Sig::REST),
    ("instance_exec", Sig::REST),
    ("method_missing", Sig::at_least(1)),
];

const OBJECT_INSTANCE: Methods = &[
    ("class", Sig::NONE),
    ("is_a?", Sig::ONE),
    ("kind_of?", Sig::ONE),
    ("instance_of?", Sig::ONE),
    ("respond_to?", Sig::opt(1, 1)),
    ("send", Sig::at_least(1)),
    ("public_send", Sig::at_least(1)),
    ("method", Sig::ONE),
    ("methods", Sig::NONE),
    ("public_methods", Sig::opt(0, 1)),
    ("to_s", Sig::NONE),
    ("inspect", Sig::NONE),
    ("freeze", Sig::NONE),
    ("frozen?", Sig::NONE),
    ("dup", Sig::NONE),
    ("clone", Sig::NONE),
    ("tap", Sig::NONE),
    ("then", Sig::NONE),
    ("yield_self", Sig::NONE),
    ("itself", Sig::NONE),
    ("nil?", Sig::NONE),
    ("hash", Sig::NONE),
    ("object_id", Sig::NONE),
    ("display", Sig::opt(0, 1)),
    ("extend", Sig::at_least(1)),
    ("instance_variables", Sig::NONE),
    ("instance_variable_get", Sig::ONE),
    ("instance_variable_set", Sig::TWO),
    ("instance_variable_defined?", Sig::ONE),
    ("===", Sig::ONE),
    ("=~", Sig::ONE),
    ("!~", Sig::ONE),
    ("<=>", Sig::ONE),
    ("eql?", Sig::ONE),
];

// Mostly `Module` behavior, seeded where every class and module body can
// reach it through the ancestor chain.
const OBJECT_CLASS: Methods = &[
    ("new", Sig::REST),
    ("allocate", Sig::NONE),
    ("name", Sig::NONE),
    ("superclass", Sig::NONE),
    ("ancestors", Sig::NONE),
    ("instance_methods", Sig::opt(0, 1)),
    ("instance_method", Sig::ONE),
    ("attr_reader", Sig::at_least(1)),
    ("attr_writer", Sig::at_least(1)),
    ("attr_accessor", Sig::at_least(1)),
    ("attr", Sig::at_least(1)),
    ("include", Sig::at_least(1)),
    ("prepend", Sig::at_least(1)),
    ("include?", Sig::ONE),
    ("private", Sig::REST),
    ("public", Sig::REST),
    ("protected", Sig::REST),
    ("module_function", Sig::REST),
    ("private_class_method", Sig::at_least(1)),
    ("public_class_method", Sig::at_least(1)),
    ("private_constant", Sig::at_least(1)),
    ("public_constant", Sig::at_least(1)),
    ("define_method", Sig::at_least(1)),
    ("alias_method", Sig::TWO),
    ("remove_method", Sig::at_least(1)),
    ("undef_method", Sig::at_least(1)),
    ("method_defined?", Sig::ONE),
    ("const_get", Sig::at_least(1)),
    ("const_set", Sig::TWO),
    ("const_defined?", Sig::opt(1, 1)),
    ("class_variable_get", Sig::ONE),
    ("class_variable_set", Sig::TWO),
    ("class_eval", Sig::REST),
    ("module_eval", Sig::REST),
];

const COMPARABLE_INSTANCE: Methods = &[
    ("<", Sig::ONE),
    (">", Sig::ONE),
    ("<=", Sig::ONE),
    (">=", Sig::ONE),
    ("between?", Sig::TWO),
    ("clamp", Sig::opt(1, 1)),
];

const ENUMERABLE_INSTANCE: Methods = &[
    ("map", Sig::NONE),
    ("collect", Sig::NONE),
    ("flat_map", Sig::NONE),
    ("collect_concat", Sig::NONE),
    ("each_with_index", Sig::NONE),
    ("each_with_object", Sig::ONE),
    ("each_entry", Sig::NONE),
    ("each_slice", Sig::ONE),
    ("each_cons", Sig::ONE),
    ("select", Sig::NONE),
    ("filter", Sig::NONE),
    ("filter_map", Sig::NONE),
    ("reject", Sig::NONE),
    ("find", Sig::opt(0, 1)),
    ("detect", Sig::opt(0, 1)),
    ("find_index", Sig::opt(0, 1)),
    ("find_all", Sig::NONE),
    ("reduce", Sig::opt(0, 2)),
    ("inject", Sig::opt(0, 2)),
    ("sum", Sig::opt(0, 1)),
    ("min", Sig::opt(0, 1)),
    ("max", Sig::opt(0, 1)),
    ("min_by", Sig::opt(0, 1)),
    ("max_by", Sig::opt(0, 1)),
    ("minmax", Sig::NONE),
    ("sort", Sig::NONE),
    ("sort_by", Sig::NONE),
    ("count", Sig::opt(0, 1)),
    ("first", Sig::opt(0, 1)),
    ("take", Sig::ONE),
    ("take_while", Sig::NONE),
    ("drop", Sig::ONE),
    ("drop_while", Sig::NONE),
    ("zip", Sig::REST),
    ("include?", Sig::ONE),
    ("member?", Sig::ONE),
    ("to_a", Sig::NONE),
    ("to_h", Sig::NONE),
    ("entries", Sig::NONE),
    ("any?", Sig::opt(0, 1)),
    ("all?", Sig::opt(0, 1)),
    ("none?", Sig::opt(0, 1)),
    ("one?", Sig::opt(0, 1)),
    ("group_by", Sig::NONE),
    ("partition", Sig::NONE),
    ("chunk_while", Sig::NONE),
    ("slice_when", Sig::NONE),
    ("uniq", Sig::NONE),
    ("tally", Sig::NONE),
    ("lazy", Sig::NONE),
];

const NUMERIC_INSTANCE: Methods = &[
    ("+", Sig::ONE),
    ("-", Sig::ONE),
    ("*", Sig::ONE),
    ("/", Sig::ONE),
    ("%", Sig::ONE),
    ("**", Sig::ONE),
    ("-@", Sig::NONE),
    ("+@", Sig::NONE),
    ("abs", Sig::NONE),
    ("round", Sig::opt(0, 1)),
    ("floor", Sig::opt(0, 1)),
    ("ceil", Sig::opt(0, 1)),
    ("truncate", Sig::opt(0, 1)),
    ("zero?", Sig::NONE),
    ("positive?", Sig::NONE),
    ("negative?", Sig::NONE),
    ("nonzero?", Sig::NONE),
    ("to_i", Sig::NONE),
    ("to_int", Sig::NONE),
    ("to_f", Sig::NONE),
    ("to_r", Sig::NONE),
    ("to_c", Sig::NONE),
    ("coerce", Sig::ONE),
    ("divmod", Sig::ONE),
    ("div", Sig::ONE),
    ("fdiv", Sig::ONE),
    ("modulo", Sig::ONE),
    ("remainder", Sig::ONE),
    ("step", Sig::at_least(1)),
    ("integer?", Sig::NONE),
    ("finite?", Sig::NONE),
    ("infinite?", Sig::NONE),
];

const INTEGER_INSTANCE: Methods = &[
    ("times", Sig::NONE),
    ("upto", Sig::ONE),
    ("downto", Sig::ONE),
    ("succ", Sig::NONE),
    ("next", Sig::NONE),
    ("pred", Sig::NONE),
    ("chr", Sig::opt(0, 1)),
    ("ord", Sig::NONE),
    ("digits", Sig::opt(0, 1)),
    ("bit_length", Sig::NONE),
    ("even?", Sig::NONE),
    ("odd?", Sig::NONE),
    ("gcd", Sig::ONE),
    ("lcm", Sig::ONE),
    ("pow", Sig::opt(1, 1)),
    ("&", Sig::ONE),
    ("|", Sig::ONE),
    ("^", Sig::ONE),
    ("<<", Sig::ONE),
    (">>", Sig::ONE),
    ("~", Sig::NONE),
    ("[]", Sig::ONE),
    ("to_s", Sig::opt(0, 1)),
];

const FLOAT_INSTANCE: Methods = &[
    ("nan?", Sig::NONE),
    ("prev_float", Sig::NONE),
    ("next_float", Sig::NONE),
];

const STRING_INSTANCE: Methods = &[
    ("+", Sig::ONE),
    ("*", Sig::ONE),
    ("%", Sig::ONE),
    ("<<", Sig::ONE),
    ("[]", Sig::opt(1, 1)),
    ("[]=", Sig::at_least(2)),
    ("length", Sig::NONE),
    ("size", Sig::NONE),
    ("bytesize", Sig::NONE),
    ("empty?", Sig::NONE),
    ("upcase", Sig::NONE),
    ("downcase", Sig::NONE),
    ("capitalize", Sig::NONE),
    ("swapcase", Sig::NONE),
    ("upcase!", Sig::NONE),
    ("downcase!", Sig::NONE),
    ("strip", Sig::NONE),
    ("lstrip", Sig::NONE),
    ("rstrip", Sig::NONE),
    ("strip!", Sig::NONE),
    ("chomp", Sig::opt(0, 1)),
    ("chomp!", Sig::opt(0, 1)),
    ("chop", Sig::NONE),
    ("chars", Sig::NONE),
    ("bytes", Sig::NONE),
    ("lines", Sig::opt(0, 1)),
    ("each_char", Sig::NONE),
    ("each_line", Sig::opt(0, 1)),
    ("each_byte", Sig::NONE),
    ("split", Sig::opt(0, 2)),
    ("sub", Sig::opt(1, 1)),
    ("sub!", Sig::opt(1, 1)),
    ("gsub", Sig::opt(1, 1)),
    ("gsub!", Sig::opt(1, 1)),
    ("tr", Sig::TWO),
    ("tr_s", Sig::TWO),
    ("delete", Sig::at_least(1)),
    ("squeeze", Sig::opt(0, 1)),
    ("count", Sig::at_least(1)),
    ("include?", Sig::ONE),
    ("start_with?", Sig::REST),
    ("end_with?", Sig::REST),
    ("index", Sig::opt(1, 1)),
    ("rindex", Sig::opt(1, 1)),
    ("slice", Sig::opt(1, 1)),
    ("slice!", Sig::opt(1, 1)),
    ("insert", Sig::TWO),
    ("to_i", Sig::opt(0, 1)),
    ("to_f", Sig::NONE),
    ("to_sym", Sig::NONE),
    ("to_str", Sig::NONE),
    ("to_s", Sig::NONE),
    ("intern", Sig::NONE),
    ("reverse", Sig::NONE),
    ("reverse!", Sig::NONE),
    ("replace", Sig::ONE),
    ("concat", Sig::REST),
    ("prepend", Sig::REST),
    ("center", Sig::opt(1, 1)),
    ("ljust", Sig::opt(1, 1)),
    ("rjust", Sig::opt(1, 1)),
    ("match", Sig::opt(1, 1)),
    ("match?", Sig::opt(1, 1)),
    ("=~", Sig::ONE),
    ("scan", Sig::ONE),
    ("hex", Sig::NONE),
    ("oct", Sig::NONE),
    ("succ", Sig::NONE),
    ("next", Sig::NONE),
    ("casecmp", Sig::ONE),
    ("casecmp?", Sig::ONE),
    ("encode", Sig::opt(0, 2)),
    ("encoding", Sig::NONE),
    ("force_encoding", Sig::ONE),
    ("valid_encoding?", Sig::NONE),
    ("unpack", Sig::ONE),
    ("unpack1", Sig::ONE),
];

const SYMBOL_INSTANCE: Methods = &[
    ("to_proc", Sig::NONE),
    ("to_sym", Sig::NONE),
    ("to_s", Sig::NONE),
    ("id2name", Sig::NONE),
    ("length", Sig::NONE),
    ("size", Sig::NONE),
    ("empty?", Sig::NONE),
    ("upcase", Sig::NONE),
    ("downcase", Sig::NONE),
    ("capitalize", Sig::NONE),
    ("succ", Sig::NONE),
    ("[]", Sig::opt(1, 1)),
    ("match", Sig::opt(1, 1)),
    ("match?", Sig::opt(1, 1)),
];

const ARRAY_INSTANCE: Methods = &[
    ("each", Sig::NONE),
    ("each_index", Sig::NONE),
    ("reverse_each", Sig::NONE),
    ("<<", Sig::ONE),
    ("+", Sig::ONE),
    ("-", Sig::ONE),
    ("*", Sig::ONE),
    ("&", Sig::ONE),
    ("|", Sig::ONE),
    ("<=>", Sig::ONE),
    ("[]", Sig::opt(1, 1)),
    ("[]=", Sig::at_least(2)),
    ("at", Sig::ONE),
    ("fetch", Sig::opt(1, 1)),
    ("dig", Sig::at_least(1)),
    ("push", Sig::REST),
    ("append", Sig::REST),
    ("pop", Sig::opt(0, 1)),
    ("shift", Sig::opt(0, 1)),
    ("unshift", Sig::REST),
    ("insert", Sig::at_least(1)),
    ("concat", Sig::REST),
    ("delete", Sig::ONE),
    ("delete_at", Sig::ONE),
    ("delete_if", Sig::NONE),
    ("keep_if", Sig::NONE),
    ("clear", Sig::NONE),
    ("compact", Sig::NONE),
    ("compact!", Sig::NONE),
    ("flatten", Sig::opt(0, 1)),
    ("flatten!", Sig::opt(0, 1)),
    ("uniq!", Sig::NONE),
    ("reverse", Sig::NONE),
    ("reverse!", Sig::NONE),
    ("rotate", Sig::opt(0, 1)),
    ("sort!", Sig::NONE),
    ("sort_by!", Sig::NONE),
    ("shuffle", Sig::NONE),
    ("sample", Sig::opt(0, 1)),
    ("join", Sig::opt(0, 1)),
    ("length", Sig::NONE),
    ("size", Sig::NONE),
    ("empty?", Sig::NONE),
    ("last", Sig::opt(0, 1)),
    ("index", Sig::opt(0, 1)),
    ("rindex", Sig::opt(0, 1)),
    ("values_at", Sig::REST),
    ("assoc", Sig::ONE),
    ("rassoc", Sig::ONE),
    ("pack", Sig::ONE),
    ("fill", Sig::REST),
    ("product", Sig::REST),
    ("combination", Sig::ONE),
    ("permutation", Sig::opt(0, 1)),
    ("transpose", Sig::NONE),
    ("slice", Sig::opt(1, 1)),
    ("slice!", Sig::opt(1, 1)),
    ("map!", Sig::NONE),
    ("select!", Sig::NONE),
    ("reject!", Sig::NONE),
];

const HASH_INSTANCE: Methods = &[
    ("[]", Sig::ONE),
    ("[]=", Sig::TWO),
    ("store", Sig::TWO),
    ("fetch", Sig::opt(1, 1)),
    ("fetch_values", Sig::REST),
    ("dig", Sig::at_least(1)),
    ("each", Sig::NONE),
    ("each_pair", Sig::NONE),
    ("each_key", Sig::NONE),
    ("each_value", Sig::NONE),
    ("keys", Sig::NONE),
    ("values", Sig::NONE),
    ("values_at", Sig::REST),
    ("key", Sig::ONE),
    ("key?", Sig::ONE),
    ("has_key?", Sig::ONE),
    ("value?", Sig::ONE),
    ("has_value?", Sig::ONE),
    ("delete", Sig::ONE),
    ("delete_if", Sig::NONE),
    ("merge", Sig::REST),
    ("merge!", Sig::REST),
    ("update", Sig::REST),
    ("size", Sig::NONE),
    ("length", Sig::NONE),
    ("empty?", Sig::NONE),
    ("clear", Sig::NONE),
    ("invert", Sig::NONE),
    ("transform_keys", Sig::NONE),
    ("transform_values", Sig::NONE),
    ("compact", Sig::NONE),
    ("compact!", Sig::NONE),
    ("default", Sig::opt(0, 1)),
    ("default=", Sig::ONE),
    ("slice", Sig::REST),
    ("except", Sig::REST),
];

const RANGE_INSTANCE: Methods = &[
    ("each", Sig::NONE),
    ("first", Sig::opt(0, 1)),
    ("last", Sig::opt(0, 1)),
    ("begin", Sig::NONE),
    ("end", Sig::NONE),
    ("cover?", Sig::ONE),
    ("include?", Sig::ONE),
    ("member?", Sig::ONE),
    ("step", Sig::at_least(1)),
    ("size", Sig::NONE),
    ("exclude_end?", Sig::NONE),
];

const REGEXP_INSTANCE: Methods = &[
    ("match", Sig::opt(1, 1)),
    ("match?", Sig::opt(1, 1)),
    ("=~", Sig::ONE),
    ("===", Sig::ONE),
    ("source", Sig::NONE),
    ("options", Sig::NONE),
    ("names", Sig::NONE),
];

const NIL_INSTANCE: Methods = &[
    ("to_a", Sig::NONE),
    ("to_s", Sig::NONE),
    ("to_i", Sig::NONE),
    ("to_f", Sig::NONE),
    ("to_h", Sig::NONE),
];

const BOOLEAN_INSTANCE: Methods = &[
    ("&", Sig::ONE),
    ("|", Sig::ONE),
    ("^", Sig::ONE),
    ("to_s", Sig::NONE),
];

const PROC_INSTANCE: Methods = &[
    ("call", Sig::REST),
    ("[]", Sig::REST),
    ("===", Sig::ONE),
    ("arity", Sig::NONE),
    ("curry", Sig::opt(0, 1)),
    ("lambda?", Sig::NONE),
    ("to_proc", Sig::NONE),
    ("parameters", Sig::NONE),
];

const EXCEPTION_INSTANCE: Methods = &[
    ("message", Sig::NONE),
    ("to_s", Sig::NONE),
    ("full_message", Sig::NONE),
    ("backtrace", Sig::NONE),
    ("cause", Sig::NONE),
    ("exception", Sig::opt(0, 1)),
];

const IO_INSTANCE: Methods = &[
    ("puts", Sig::REST),
    ("print", Sig::REST),
    ("printf", Sig::at_least(1)),
    ("write", Sig::REST),
    ("read", Sig::opt(0, 2)),
    ("gets", Sig::opt(0, 1)),
    ("each_line", Sig::opt(0, 1)),
    ("close", Sig::NONE),
    ("closed?", Sig::NONE),
    ("flush", Sig::NONE),
    ("sync", Sig::NONE),
    ("fileno", Sig::NONE),
    ("eof?", Sig::NONE),
];

const FILE_CLASS: Methods = &[
    ("read", Sig::at_least(1)),
    ("write", Sig::at_least(2)),
    ("open", Sig::at_least(1)),
    ("readlines", Sig::at_least(1)),
    ("exist?", Sig::ONE),
    ("file?", Sig::ONE),
    ("directory?", Sig::ONE),
    ("join", Sig::REST),
    ("expand_path", Sig::opt(1, 1)),
    ("absolute_path", Sig::opt(1, 1)),
    ("realpath", Sig::opt(1, 1)),
    ("basename", Sig::opt(1, 1)),
    ("dirname", Sig::ONE),
    ("extname", Sig::ONE),
    ("delete", Sig::REST),
    ("rename", Sig::TWO),
    ("size", Sig::ONE),
    ("mtime", Sig::ONE),
];

const DIR_CLASS: Methods = &[
    ("glob", Sig::at_least(1)),
    ("entries", Sig::ONE),
    ("children", Sig::ONE),
    ("each_child", Sig::ONE),
    ("exist?", Sig::ONE),
    ("pwd", Sig::NONE),
    ("home", Sig::opt(0, 1)),
    ("chdir", Sig::opt(0, 1)),
    ("mkdir", Sig::opt(1, 1)),
    ("rmdir", Sig::ONE),
];

const ENV_CLASS: Methods = &[
    ("[]", Sig::ONE),
    ("[]=", Sig::TWO),
    ("fetch", Sig::opt(1, 1)),
    ("key?", Sig::ONE),
    ("has_key?", Sig::ONE),
    ("include?", Sig::ONE),
    ("keys", Sig::NONE),
    ("values", Sig::NONE),
    ("each", Sig::NONE),
    ("delete", Sig::ONE),
    ("to_h", Sig::NONE),
];

const TIME_INSTANCE: Methods = &[
    ("year", Sig::NONE),
    ("mon", Sig::NONE),
    ("month", Sig::NONE),
    ("day", Sig::NONE),
    ("hour", Sig::NONE),
    ("min", Sig::NONE),
    ("sec", Sig::NONE),
    ("usec", Sig::NONE),
    ("nsec", Sig::NONE),
    ("wday", Sig::NONE),
    ("yday", Sig::NONE),
    ("zone", Sig::NONE),
    ("utc", Sig::NONE),
    ("localtime", Sig::NONE),
    ("to_i", Sig::NONE),
    ("to_f", Sig::NONE),
    ("to_s", Sig::NONE),
    ("strftime", Sig::ONE),
    ("+", Sig::ONE),
    ("-", Sig::ONE),
];

const TIME_CLASS: Methods = &[
    ("now", Sig::NONE),
    ("at", Sig::at_least(1)),
];

const MATH_CLASS: Methods = &[
    ("sqrt", Sig::ONE),
    ("cbrt", Sig::ONE),
    ("sin", Sig::ONE),
    ("cos", Sig::ONE),
    ("tan", Sig::ONE),
    ("atan", Sig::ONE),
    ("atan2", Sig::TWO),
    ("hypot", Sig::TWO),
    ("log", Sig::opt(1, 1)),
    ("log2", Sig::ONE),
    ("log10", Sig::ONE),
    ("exp", Sig::ONE),
];

const STRUCT_CLASS: Methods = &[("new", Sig::REST)];

const STRUCT_INSTANCE: Methods = &[
    ("members", Sig::NONE),
    ("to_a", Sig::NONE),
    ("to_h", Sig::NONE),
    ("each", Sig::NONE),
    ("[]", Sig::ONE),
    ("[]=", Sig::TWO),
];

const RANGE_CLASS: Methods = &[("new", Sig::opt(2, 1))];
const REGEXP_CLASS: Methods = &[
    ("new", Sig::opt(1, 1)),
    ("escape", Sig::ONE),
    ("union", Sig::REST),
    ("last_match", Sig::opt(0, 1)),
];
const ARRAY_CLASS: Methods = &[("new", Sig::opt(0, 2))];
const HASH_CLASS: Methods = &[("new", Sig::opt(0, 1))];
const EXCEPTION_CLASS: Methods = &[
    ("new", Sig::opt(0, 1)),
    ("exception", Sig::opt(0, 1)),
];
const NAME_ERROR_INSTANCE: Methods = &[("name", Sig::NONE), ("receiver", Sig::NONE)];

fn class(name: &'static str) -> BuiltinClass {
    BuiltinClass { name, ..BLANK }
}

fn exception(name: &'static str, superclass: &'static str) -> BuiltinClass {
    BuiltinClass {
        name,
        superclass: Some(superclass),
        ..BLANK
    }
}

/// Immutable set of seed definitions, built once and shared read-only
/// across every analyzed source.
pub struct BuiltinLibrary {
    classes: Vec<BuiltinClass>,
    /// Constants filed at the root, each an instance of the named class.
    instance_constants: Vec<(&'static str, &'static str)>,
    /// Pre-defined global variables and the class they hold an instance
    /// of.
    global_variables: Vec<(&'static str, &'static str)>,
}

impl BuiltinLibrary {
    pub fn standard() -> Self {
        let classes = vec![
            BuiltinClass {
                name: "BasicObject",
                instance_methods: BASIC_OBJECT_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Kernel",
                module: true,
                instance_methods: KERNEL_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Object",
                superclass: Some("BasicObject"),
                includes: &["Kernel"],
                instance_methods: OBJECT_INSTANCE,
                class_methods: OBJECT_CLASS,
                ..BLANK
            },
            class("Module"),
            BuiltinClass {
                name: "Class",
                superclass: Some("Module"),
                ..BLANK
            },
            BuiltinClass {
                name: "Comparable",
                module: true,
                instance_methods: COMPARABLE_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Enumerable",
                module: true,
                instance_methods: ENUMERABLE_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Numeric",
                includes: &["Comparable"],
                instance_methods: NUMERIC_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Integer",
                superclass: Some("Numeric"),
                instance_methods: INTEGER_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Float",
                superclass: Some("Numeric"),
                instance_methods: FLOAT_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "String",
                includes: &["Comparable"],
                instance_methods: STRING_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Symbol",
                includes: &["Comparable"],
                instance_methods: SYMBOL_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Array",
                includes: &["Enumerable"],
                instance_methods: ARRAY_INSTANCE,
                class_methods: ARRAY_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "Hash",
                includes: &["Enumerable"],
                instance_methods: HASH_INSTANCE,
                class_methods: HASH_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "Range",
                includes: &["Enumerable"],
                instance_methods: RANGE_INSTANCE,
                class_methods: RANGE_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "Regexp",
                instance_methods: REGEXP_INSTANCE,
                class_methods: REGEXP_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "NilClass",
                instance_methods: NIL_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "TrueClass",
                instance_methods: BOOLEAN_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "FalseClass",
                instance_methods: BOOLEAN_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Proc",
                instance_methods: PROC_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "Struct",
                instance_methods: STRUCT_INSTANCE,
                class_methods: STRUCT_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "Time",
                includes: &["Comparable"],
                instance_methods: TIME_INSTANCE,
                class_methods: TIME_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "Math",
                module: true,
                class_methods: MATH_CLASS,
                constants: &[("PI", "Float"), ("E", "Float")],
                ..BLANK
            },
            BuiltinClass {
                name: "IO",
                instance_methods: IO_INSTANCE,
                ..BLANK
            },
            BuiltinClass {
                name: "File",
                superclass: Some("IO"),
                class_methods: FILE_CLASS,
                instance_methods: &[("path", Sig::NONE), ("size", Sig::NONE)],
                ..BLANK
            },
            BuiltinClass {
                name: "Dir",
                class_methods: DIR_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "ENV",
                class_methods: ENV_CLASS,
                ..BLANK
            },
            BuiltinClass {
                name: "Exception",
                instance_methods: EXCEPTION_INSTANCE,
                class_methods: EXCEPTION_CLASS,
                ..BLANK
            },
            exception("ScriptError", "Exception"),
            exception("SystemExit", "Exception"),
            exception("StandardError", "Exception"),
            exception("RuntimeError", "StandardError"),
            exception("FrozenError", "RuntimeError"),
            exception("ArgumentError", "StandardError"),
            exception("TypeError", "StandardError"),
            exception("RangeError", "StandardError"),
            exception("IOError", "StandardError"),
            exception("EOFError", "IOError"),
            exception("ZeroDivisionError", "StandardError"),
            exception("NotImplementedError", "ScriptError"),
            BuiltinClass {
                name: "NameError",
                superclass: Some("StandardError"),
                instance_methods: NAME_ERROR_INSTANCE,
                ..BLANK
            },
            exception("NoMethodError", "NameError"),
            exception("IndexError", "StandardError"),
            exception("KeyError", "IndexError"),
            exception("StopIteration", "IndexError"),
        ];

        Self {
            classes,
            instance_constants: vec![
                ("ARGV", "Array"),
                ("STDOUT", "IO"),
                ("STDERR", "IO"),
                ("STDIN", "IO"),
                ("RUBY_VERSION", "String"),
                ("RUBY_PLATFORM", "String"),
            ],
            global_variables: vec![
                ("$stdout", "IO"),
                ("$stderr", "IO"),
                ("$stdin", "IO"),
                ("$0", "String"),
                ("$PROGRAM_NAME", "String"),
                ("$!", "Exception"),
                ("$*", "Array"),
                ("$$", "Integer"),
                ("$LOAD_PATH", "Array"),
                ("$LOADED_FEATURES", "Array"),
                ("$DEBUG", "FalseClass"),
                ("$VERBOSE", "FalseClass"),
            ],
        }
    }

    /// Replays the declarations into `graph`. Must run before the graph
    /// sees any user code; afterwards the library is not consulted again
    /// for that graph.
    pub fn seed(&self, graph: &mut DefinitionGraph) {
        let root = graph.root();
        let mut ids: FxHashMap<&str, DefinitionId> = FxHashMap::default();

        for class in &self.classes {
            let mut definition = Definition::named(DefKind::Const, class.name);
            definition.reference_amount = 1;
            let (id, _) = graph.define(root, definition);
            ids.insert(class.name, id);
        }

        let object = ids.get("Object").copied().unwrap_or(root);

        for class in &self.classes {
            let Some(&id) = ids.get(class.name) else {
                continue;
            };

            let mut parents: SmallVec<[DefinitionId; 2]> = SmallVec::new();
            for include in class.includes {
                if let Some(&module) = ids.get(include) {
                    parents.push(module);
                }
            }
            if !class.module && class.name != "BasicObject" {
                let superclass = class
                    .superclass
                    .and_then(|name| ids.get(name).copied())
                    .unwrap_or(object);
                parents.push(superclass);
            }
            parents.push(root);
            graph.get_mut(id).parents = parents;

            seed_methods(graph, id, DefKind::InstanceMethod, class.instance_methods);
            seed_methods(graph, id, DefKind::ClassMethod, class.class_methods);

            for (constant, class_name) in class.constants {
                if let Some(&of) = ids.get(class_name) {
                    seed_instance_constant(graph, id, constant, of);
                }
            }
        }

        for (constant, class_name) in &self.instance_constants {
            if let Some(&of) = ids.get(class_name) {
                seed_instance_constant(graph, root, constant, of);
            }
        }

        for (global, class_name) in &self.global_variables {
            if let Some(&of) = ids.get(class_name) {
                let companion = graph.instance_of(of);
                graph.define(
                    root,
                    Definition::named(DefKind::Gvar, *global).with_value(companion),
                );
            }
        }

        // The top level behaves like an Object instance: `puts` works in
        // a script body and module bodies reach Object behavior through
        // the root.
        graph.get_mut(root).parents = SmallVec::from_slice(&[object]);
    }
}

fn seed_methods(graph: &mut DefinitionGraph, owner: DefinitionId, kind: DefKind, methods: Methods) {
    for (name, sig) in methods {
        let (method, _) = graph.define(owner, Definition::named(kind, *name));
        for index in 0..sig.required {
            graph.define(
                method,
                Definition::named(DefKind::Arg, format!("arg{}", index + 1)),
            );
        }
        for index in 0..sig.optional {
            graph.define(
                method,
                Definition::named(DefKind::Optarg, format!("opt{}", index + 1)),
            );
        }
        if sig.rest {
            graph.define(method, Definition::named(DefKind::Restarg, "args"));
        }
    }
}

fn seed_instance_constant(
    graph: &mut DefinitionGraph,
    scope: DefinitionId,
    name: &str,
    of: DefinitionId,
) {
    let (id, created) = graph.define(scope, Definition::named(DefKind::Const, name));
    if created {
        let definition = graph.get_mut(id);
        definition.is_instance = true;
        definition.parents.push(of);
        definition.reference_amount = 1;
    }
}
